//! User data model: identity, time zone, and notification delivery tokens.
//!
//! The time zone is kept as the raw IANA name the user registered with.
//! Resolution happens in [`crate::domain::local_time`] so an unknown zone
//! fails closed at the point of use instead of making the user unloadable.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::local_time::LocalDate;

/// Validation errors returned by user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyName,
    EmptyEmail,
    EmptyTimeZone,
    EmptyDeliveryToken,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyTimeZone => write!(f, "time zone must not be empty"),
            Self::EmptyDeliveryToken => write!(f, "delivery token must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Push notification delivery token registered by one of the user's devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeliveryToken(String);

impl DeliveryToken {
    /// Validate a token; surrounding whitespace is trimmed.
    pub fn new(token: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDeliveryToken);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DeliveryToken {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeliveryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DeliveryToken> for String {
    fn from(value: DeliveryToken) -> Self {
        value.0
    }
}

impl TryFrom<String> for DeliveryToken {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Input for [`User::new`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub time_zone: String,
    pub delivery_tokens: Vec<DeliveryToken>,
    pub last_reminded_on: Option<LocalDate>,
}

/// Application user.
///
/// ## Invariants
/// - `name`, `email`, and `time_zone` are non-empty once trimmed.
/// - `delivery_tokens` holds no duplicates; insertion order is kept.
///
/// # Examples
/// ```
/// use medroutines::domain::{User, UserDraft, UserId};
///
/// let user = User::new(UserDraft {
///     id: UserId::random(),
///     name: "Ada Lovelace".into(),
///     email: "ada@example.org".into(),
///     time_zone: "Europe/London".into(),
///     delivery_tokens: Vec::new(),
///     last_reminded_on: None,
/// })
/// .unwrap();
/// assert_eq!(user.time_zone(), "Europe/London");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    time_zone: String,
    delivery_tokens: Vec<DeliveryToken>,
    last_reminded_on: Option<LocalDate>,
}

impl User {
    pub fn new(draft: UserDraft) -> Result<Self, UserValidationError> {
        let UserDraft {
            id,
            name,
            email,
            time_zone,
            delivery_tokens,
            last_reminded_on,
        } = draft;

        let name = name.trim();
        if name.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let time_zone = time_zone.trim();
        if time_zone.is_empty() {
            return Err(UserValidationError::EmptyTimeZone);
        }

        let mut unique: Vec<DeliveryToken> = Vec::with_capacity(delivery_tokens.len());
        for token in delivery_tokens {
            if !unique.contains(&token) {
                unique.push(token);
            }
        }

        Ok(Self {
            id,
            name: name.to_owned(),
            email: email.to_owned(),
            time_zone: time_zone.to_owned(),
            delivery_tokens: unique,
            last_reminded_on,
        })
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// IANA zone name as registered.
    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    pub fn delivery_tokens(&self) -> &[DeliveryToken] {
        &self.delivery_tokens
    }

    /// Local date of the last reminder sent, if any.
    pub fn last_reminded_on(&self) -> Option<LocalDate> {
        self.last_reminded_on
    }
}
