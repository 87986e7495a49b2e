//! Port for routine persistence, including the taken history.
//!
//! Both writes are units of work: an adapter either commits every row the
//! call describes or none of them.

use async_trait::async_trait;

use crate::domain::{Routine, RoutineId, TakenRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by routine repository adapters.
    pub enum RoutineRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } retryable =>
            "routine repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "routine repository query failed: {message}",
        /// A referenced medicine disappeared before the routine was stored.
        MissingMedicine { message: String } =>
            "routine references a missing medicine: {message}",
        /// The routine does not exist.
        RoutineMissing { routine_id: String } =>
            "routine {routine_id} does not exist",
        /// A taken record for the same entry, date, and slot already exists.
        DuplicateTaken { routine_medicine_id: String } =>
            "dose for routine medicine {routine_medicine_id} already recorded",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutineRepository: Send + Sync {
    /// Store a new routine and all of its entries atomically.
    async fn create(&self, routine: &Routine) -> Result<(), RoutineRepositoryError>;

    /// All routines owned by `owner` with entries, medicine names, and taken
    /// history, oldest first.
    async fn list_for_user(&self, owner: &UserId) -> Result<Vec<Routine>, RoutineRepositoryError>;

    /// One of `owner`'s routines.
    async fn find_for_user(
        &self,
        owner: &UserId,
        id: &RoutineId,
    ) -> Result<Option<Routine>, RoutineRepositoryError>;

    /// Append taken records and their back-references in one unit of work.
    ///
    /// Either every record is stored or none is. A record whose (routine,
    /// entry, date, slot) already exists fails the whole call with
    /// [`RoutineRepositoryError::DuplicateTaken`].
    async fn record_taken(
        &self,
        routine_id: &RoutineId,
        records: &[TakenRecord],
    ) -> Result<(), RoutineRepositoryError>;
}
