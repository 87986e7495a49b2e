//! Port for push notification delivery.
//!
//! Delivery is fire-and-forget from the domain's point of view: one call fans
//! out to every token and reports a per-token outcome. A transport failure
//! for the whole call is reported as an error instead.

use async_trait::async_trait;

use crate::domain::DeliveryToken;

use super::define_port_error;

define_port_error! {
    /// Errors that prevented a delivery call from producing per-token results.
    pub enum NotificationDeliveryError {
        /// The push service could not be reached or timed out.
        Transport { message: String } retryable =>
            "notification transport failed: {message}",
        /// The push service refused the request as a whole.
        Rejected { message: String } =>
            "notification request rejected: {message}",
    }
}

/// Title and body of a push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Why delivery to a single token failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The token is permanently unusable and should be pruned.
    InvalidToken { code: String },
    /// Any other failure; the token stays registered.
    Transient { message: String },
}

impl DeliveryFailure {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::InvalidToken { .. })
    }
}

/// Per-token delivery result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed(DeliveryFailure),
}

/// Outcome of delivering to one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub token: DeliveryToken,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn delivered(token: DeliveryToken) -> Self {
        Self {
            token,
            status: DeliveryStatus::Delivered,
        }
    }

    pub fn failed(token: DeliveryToken, failure: DeliveryFailure) -> Self {
        Self {
            token,
            status: DeliveryStatus::Failed(failure),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.status, DeliveryStatus::Delivered)
    }

    /// Whether the token should be removed from the user's set.
    pub fn token_is_invalid(&self) -> bool {
        matches!(&self.status, DeliveryStatus::Failed(failure) if failure.is_permanent())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    /// Deliver one notification to every token.
    async fn deliver(
        &self,
        tokens: &[DeliveryToken],
        notification: &PushNotification,
    ) -> Result<Vec<DeliveryOutcome>, NotificationDeliveryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn token(raw: &str) -> DeliveryToken {
        DeliveryToken::new(raw).expect("token")
    }

    #[rstest]
    fn only_invalid_tokens_are_prunable() {
        let invalid = DeliveryOutcome::failed(
            token("a"),
            DeliveryFailure::InvalidToken {
                code: "NotRegistered".to_owned(),
            },
        );
        let transient = DeliveryOutcome::failed(
            token("b"),
            DeliveryFailure::Transient {
                message: "Unavailable".to_owned(),
            },
        );
        assert!(invalid.token_is_invalid());
        assert!(!transient.token_is_invalid());
        assert!(!DeliveryOutcome::delivered(token("c")).token_is_invalid());
    }
}
