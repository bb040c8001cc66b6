//! Business logic services.

pub mod attachment;
pub mod chat;
pub mod event_publisher;
pub mod permission;
pub mod trackers;

pub use attachment::{AttachmentService, UploadAttachmentInput};
pub use chat::{ChatService, GetChannelMessagesResult, SendMessageResult, ToggleReactionResult};
pub use event_publisher::{ChatEventPublisher, EventPublisherService, NoOpEventPublisher};
pub use permission::{ChannelPermissions, Membership, PermissionService};
pub use trackers::{
    NoOpPresenceTracker, NoOpUnreadLedger, PresenceTracker, PresenceTrackerService, UnreadLedger,
    UnreadLedgerService,
};
