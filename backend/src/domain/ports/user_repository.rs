//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{DeliveryToken, LocalDate, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } retryable => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or update a user's profile fields.
    ///
    /// Delivery tokens are managed separately and are left untouched.
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier, including delivery tokens.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Every user holding at least one delivery token.
    async fn list_with_delivery_tokens(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Add a token to the user's set.
    ///
    /// Returns `false` when the user already held the token.
    async fn add_delivery_token(
        &self,
        id: &UserId,
        token: &DeliveryToken,
    ) -> Result<bool, UserPersistenceError>;

    /// Remove the given tokens from the user's set; unknown tokens are ignored.
    async fn remove_delivery_tokens(
        &self,
        id: &UserId,
        tokens: &[DeliveryToken],
    ) -> Result<(), UserPersistenceError>;

    /// Record the local date on which the user was last reminded.
    async fn mark_reminded(&self, id: &UserId, on: LocalDate) -> Result<(), UserPersistenceError>;
}
