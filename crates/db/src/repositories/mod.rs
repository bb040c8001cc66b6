//! Repository layer.
//!
//! Each repository owns the SQL for one aggregate and maps driver errors
//! into [`huddle_common::AppError`].

pub mod attachment;
pub mod channel;
pub mod mention;
pub mod message;
pub mod reaction;

pub use attachment::AttachmentRepository;
pub use channel::ChannelRepository;
pub use mention::MentionRepository;
pub use message::{
    MessagePage, MessageQuery, MessageRepository, ParentFilter, SortDirection,
};
pub use reaction::ReactionRepository;
