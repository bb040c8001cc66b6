//! Channel permission service.
//!
//! Authorization in a channel starts from the membership row: the role
//! (owner, moderator, member) plus per-member permission bits.

use huddle_common::{AppError, AppResult};
use huddle_db::entities::channel_member::{self, ChannelRole};
use huddle_db::repositories::ChannelRepository;

/// Permission bits a member can hold on top of their role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelPermissions {
    /// May moderate other members' messages.
    pub manage_messages: bool,
}

/// A user's standing in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub role: ChannelRole,
    pub permissions: ChannelPermissions,
}

impl Membership {
    /// Whether this member may delete a message authored by `author_id`.
    ///
    /// Authors always may; owners always may; moderators only with the
    /// `manage_messages` bit.
    #[must_use]
    pub fn can_delete_message(&self, author_id: &str, caller_id: &str) -> bool {
        if caller_id == author_id {
            return true;
        }
        match self.role {
            ChannelRole::Owner => true,
            ChannelRole::Moderator => self.permissions.manage_messages,
            ChannelRole::Member => false,
        }
    }
}

impl From<channel_member::Model> for Membership {
    fn from(model: channel_member::Model) -> Self {
        Self {
            role: model.role,
            permissions: ChannelPermissions {
                manage_messages: model.can_manage_messages,
            },
        }
    }
}

/// Permission service for channel authorization checks.
#[derive(Clone)]
pub struct PermissionService {
    channel_repo: ChannelRepository,
}

impl PermissionService {
    /// Create a new permission service.
    #[must_use]
    pub const fn new(channel_repo: ChannelRepository) -> Self {
        Self { channel_repo }
    }

    /// Check whether a user belongs to a channel.
    pub async fn is_member(&self, channel_id: &str, user_id: &str) -> AppResult<bool> {
        self.channel_repo.is_member(channel_id, user_id).await
    }

    /// Get a user's membership in a channel, if any.
    pub async fn get_membership(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Membership>> {
        Ok(self
            .channel_repo
            .find_member(channel_id, user_id)
            .await?
            .map(Membership::from))
    }

    /// Get a user's membership, failing with a permission error when the
    /// user does not belong to the channel.
    pub async fn require_membership(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> AppResult<Membership> {
        self.get_membership(channel_id, user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Not a member of this channel".to_string()))
    }
}
