//! Driving port for reading routines.

use async_trait::async_trait;

use crate::domain::{Error, Routine, RoutineId, UserId};

/// Domain use-case port for routine reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutineQuery: Send + Sync {
    /// Every routine owned by `owner`.
    async fn list(&self, owner: &UserId) -> Result<Vec<Routine>, Error>;

    /// One routine owned by `owner`; foreign routines are `not_found`.
    async fn get(&self, owner: &UserId, id: &RoutineId) -> Result<Routine, Error>;
}
