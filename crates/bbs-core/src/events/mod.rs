//! Domain events fanned out by the notification hub

mod notification;

pub use notification::{EventCategory, NotificationEvent};
