//! Push notification adapters implementing `NotificationDelivery`.

mod dto;
mod http;
mod logging;

pub use http::{HttpNotificationDelivery, MAX_TOKENS_PER_REQUEST, PushEndpoint};
pub use logging::LoggingNotificationDelivery;
