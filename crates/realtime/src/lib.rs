//! Realtime layer for huddle-rs.
//!
//! Everything backed by Redis lives here: room-addressed event fan-out over
//! Pub/Sub, the TTL presence tracker, the unread counters, and the periodic
//! sweeper that prunes stale presence entries.

pub mod presence;
pub mod pubsub;
pub mod sweeper;
pub mod unread;

pub use presence::RedisPresenceTracker;
pub use pubsub::{ChatEvent, RedisPubSub, RoomMessage, rooms};
pub use sweeper::PresenceSweeper;
pub use unread::RedisUnreadLedger;
