//! Notification hub
//!
//! Connection registry, subscription matching, event batching, and
//! heartbeat-driven eviction.

mod batch;
mod heartbeat;
mod hub;

pub use batch::BatchBuffer;
pub use heartbeat::HeartbeatMonitor;
pub use hub::{NotificationHub, SubscribeError};
