//! Driving port for recording taken doses.

use async_trait::async_trait;

use crate::domain::{DoseOccasion, Error, RoutineId, RoutineMedicineId, TakenRecord, UserId};

/// Request to mark one routine entry as taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTakenRequest {
    pub routine_id: RoutineId,
    pub routine_medicine_id: RoutineMedicineId,
    pub occasion: DoseOccasion,
}

/// Request to mark several entries of one routine as taken together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTakenBatchRequest {
    pub routine_id: RoutineId,
    pub routine_medicine_ids: Vec<RoutineMedicineId>,
    pub occasion: DoseOccasion,
}

/// Domain use-case port for the taken recorder.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TakenCommand: Send + Sync {
    /// Record one dose. A repeat for the same occasion is a `conflict`.
    async fn record(
        &self,
        owner: &UserId,
        request: RecordTakenRequest,
    ) -> Result<TakenRecord, Error>;

    /// Record several doses all-or-nothing.
    async fn record_multiple(
        &self,
        owner: &UserId,
        request: RecordTakenBatchRequest,
    ) -> Result<Vec<TakenRecord>, Error>;
}
