//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call it to authenticate credentials without knowing the
//! identity provider behind it. Handler tests substitute a double.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, User, UserDraft, UserId};

/// Domain use-case port for authentication.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}

/// Email of the development account accepted by [`FixtureLoginService`].
pub const FIXTURE_EMAIL: &str = "ada@example.org";
const FIXTURE_PASSWORD: &str = "password";
const FIXTURE_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

/// Development authenticator standing in for the identity provider.
///
/// `ada@example.org` / `password` authenticates as a fixed user whose
/// profile is available from [`FixtureLoginService::fixture_user`] so
/// storage adapters can seed it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

impl FixtureLoginService {
    /// Identifier of the fixture account.
    pub fn fixture_user_id() -> Result<UserId, Error> {
        UserId::new(FIXTURE_USER_ID)
            .map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))
    }

    /// Profile of the fixture account.
    pub fn fixture_user() -> Result<User, Error> {
        User::new(UserDraft {
            id: Self::fixture_user_id()?,
            name: "Ada Lovelace".to_owned(),
            email: FIXTURE_EMAIL.to_owned(),
            time_zone: "Europe/London".to_owned(),
            delivery_tokens: Vec::new(),
            last_reminded_on: None,
        })
        .map_err(|err| Error::internal(format!("invalid fixture user: {err}")))
    }
}

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        if credentials.email() == FIXTURE_EMAIL && credentials.password() == FIXTURE_PASSWORD {
            Self::fixture_user_id()
        } else {
            Err(Error::unauthorized("invalid credentials"))
        }
    }
}
