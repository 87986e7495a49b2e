//! Delivery adapter that only logs notifications.
//!
//! Used when no push endpoint is configured so the reminder sweep still runs
//! end to end in local development.

use async_trait::async_trait;
use tracing::info;

use crate::domain::DeliveryToken;
use crate::domain::ports::{
    DeliveryOutcome, NotificationDelivery, NotificationDeliveryError, PushNotification,
};

/// Reports every token as delivered after logging the notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotificationDelivery;

#[async_trait]
impl NotificationDelivery for LoggingNotificationDelivery {
    async fn deliver(
        &self,
        tokens: &[DeliveryToken],
        notification: &PushNotification,
    ) -> Result<Vec<DeliveryOutcome>, NotificationDeliveryError> {
        info!(
            tokens = tokens.len(),
            title = %notification.title,
            body = %notification.body,
            "push delivery not configured; logging notification"
        );
        Ok(tokens
            .iter()
            .cloned()
            .map(DeliveryOutcome::delivered)
            .collect())
    }
}
