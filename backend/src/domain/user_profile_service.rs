//! User profile service: current user lookup and device registration.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{UserProfile, UserRepository};
use crate::domain::service_support::map_user_error;
use crate::domain::{DeliveryToken, Error, User, UserId};

const USER_NOT_FOUND: &str = "Could not find user for provided id";

/// Service implementing [`UserProfile`].
#[derive(Clone)]
pub struct UserProfileService<U> {
    users: Arc<U>,
}

impl<U> UserProfileService<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U> UserProfile for UserProfileService<U>
where
    U: UserRepository,
{
    async fn fetch_profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))
    }

    async fn register_delivery_token(
        &self,
        user_id: &UserId,
        token: DeliveryToken,
    ) -> Result<bool, Error> {
        self.fetch_profile(user_id).await?;
        let added = self
            .users
            .add_delivery_token(user_id, &token)
            .await
            .map_err(map_user_error)?;
        if added {
            info!(user_id = %user_id, "delivery token registered");
        }
        Ok(added)
    }
}
