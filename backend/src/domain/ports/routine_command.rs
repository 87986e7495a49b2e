//! Driving port for creating routines.

use async_trait::async_trait;

use crate::domain::{Error, Routine, RoutineRequest, UserId};

/// Domain use-case port for routine mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutineCommand: Send + Sync {
    /// Create a routine for `owner`.
    ///
    /// Fails with `not_found` when the user or any referenced medicine is
    /// missing; nothing is stored in that case.
    async fn create(&self, owner: &UserId, request: RoutineRequest) -> Result<Routine, Error>;
}
