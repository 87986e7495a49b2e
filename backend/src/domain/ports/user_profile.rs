//! Driving port for the signed-in user's profile.

use async_trait::async_trait;

use crate::domain::{DeliveryToken, Error, User, UserId};

/// Domain use-case port for profile reads and device registration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserProfile: Send + Sync {
    /// Return the profile for the authenticated user.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error>;

    /// Register a delivery token; returns `false` when it was already held.
    async fn register_delivery_token(
        &self,
        user_id: &UserId,
        token: DeliveryToken,
    ) -> Result<bool, Error>;
}
