//! Database entities.

pub mod attachment;
pub mod channel;
pub mod channel_member;
pub mod mention;
pub mod message;
pub mod reaction;

pub use attachment::Entity as Attachment;
pub use channel::Entity as Channel;
pub use channel_member::Entity as ChannelMember;
pub use mention::Entity as Mention;
pub use message::Entity as Message;
pub use reaction::Entity as Reaction;
