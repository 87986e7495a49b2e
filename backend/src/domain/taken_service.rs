//! Taken-recorder service.
//!
//! Validation happens against the routine as loaded, then the write goes to
//! the repository as one unit of work. When two requests race for the same
//! slot, the repository's uniqueness check decides which one wins.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    RecordTakenBatchRequest, RecordTakenRequest, RoutineRepository, RoutineRepositoryError,
    TakenCommand,
};
use crate::domain::service_support::map_routine_error;
use crate::domain::{
    DoseOccasion, Error, Routine, RoutineId, RoutineMedicineId, TakenRecord, UserId,
};

const ROUTINE_NOT_FOUND: &str = "Routine not found.";
const MEDICINE_NOT_IN_ROUTINE: &str = "Medicine not found in routine.";
const ALREADY_TAKEN: &str = "Medicine already marked as taken for this slot.";
const SOME_NOT_IN_ROUTINE: &str = "One or more medicines not found in routine.";
const SOME_ALREADY_TAKEN: &str = "One or more medicines already marked as taken.";

/// Service implementing [`TakenCommand`].
#[derive(Clone)]
pub struct TakenService<R> {
    routines: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> TakenService<R> {
    /// Create a new taken recorder over the routine repository.
    pub fn new(routines: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { routines, clock }
    }
}

fn already_taken(routine: &Routine, entry: RoutineMedicineId, occasion: &DoseOccasion) -> bool {
    routine.taken().iter().any(|record| {
        record.covers(
            entry,
            occasion.day(),
            occasion.slot(),
            &occasion.date(),
        )
    })
}

impl<R> TakenService<R>
where
    R: RoutineRepository,
{
    async fn load_routine(&self, owner: &UserId, id: &RoutineId) -> Result<Routine, Error> {
        self.routines
            .find_for_user(owner, id)
            .await
            .map_err(map_routine_error)?
            .ok_or_else(|| Error::not_found(ROUTINE_NOT_FOUND))
    }

    async fn commit(
        &self,
        routine_id: &RoutineId,
        records: &[TakenRecord],
        conflict_message: &'static str,
    ) -> Result<(), Error> {
        self.routines
            .record_taken(routine_id, records)
            .await
            .map_err(|err| match err {
                RoutineRepositoryError::DuplicateTaken { .. } => Error::conflict(conflict_message),
                other => map_routine_error(other),
            })
    }
}

#[async_trait]
impl<R> TakenCommand for TakenService<R>
where
    R: RoutineRepository,
{
    async fn record(
        &self,
        owner: &UserId,
        request: RecordTakenRequest,
    ) -> Result<TakenRecord, Error> {
        let RecordTakenRequest {
            routine_id,
            routine_medicine_id,
            occasion,
        } = request;

        let routine = self.load_routine(owner, &routine_id).await?;
        if routine.entry(routine_medicine_id).is_none() {
            return Err(Error::not_found(MEDICINE_NOT_IN_ROUTINE));
        }
        if already_taken(&routine, routine_medicine_id, &occasion) {
            return Err(Error::conflict(ALREADY_TAKEN));
        }

        let record = TakenRecord::new(routine_id, routine_medicine_id, occasion, self.clock.utc());
        self.commit(&routine_id, std::slice::from_ref(&record), ALREADY_TAKEN)
            .await?;

        info!(
            routine_id = %routine_id,
            routine_medicine_id = %routine_medicine_id,
            date = %record.date,
            slot = %record.slot,
            "dose recorded"
        );
        Ok(record)
    }

    async fn record_multiple(
        &self,
        owner: &UserId,
        request: RecordTakenBatchRequest,
    ) -> Result<Vec<TakenRecord>, Error> {
        let RecordTakenBatchRequest {
            routine_id,
            routine_medicine_ids,
            occasion,
        } = request;

        if routine_medicine_ids.is_empty() {
            return Err(Error::invalid_request(
                "At least one routine medicine id is required.",
            ));
        }
        let mut seen = HashSet::with_capacity(routine_medicine_ids.len());
        if !routine_medicine_ids.iter().all(|id| seen.insert(*id)) {
            return Err(Error::invalid_request(
                "Routine medicine ids must not repeat.",
            ));
        }

        let routine = self.load_routine(owner, &routine_id).await?;
        let unknown: Vec<RoutineMedicineId> = routine_medicine_ids
            .iter()
            .copied()
            .filter(|id| routine.entry(*id).is_none())
            .collect();
        if !unknown.is_empty() {
            return Err(Error::not_found(SOME_NOT_IN_ROUTINE)
                .with_details(json!({ "routineMedicineIds": unknown })));
        }
        let taken: Vec<RoutineMedicineId> = routine_medicine_ids
            .iter()
            .copied()
            .filter(|id| already_taken(&routine, *id, &occasion))
            .collect();
        if !taken.is_empty() {
            return Err(Error::conflict(SOME_ALREADY_TAKEN)
                .with_details(json!({ "routineMedicineIds": taken })));
        }

        let recorded_at = self.clock.utc();
        let records: Vec<TakenRecord> = routine_medicine_ids
            .into_iter()
            .map(|id| TakenRecord::new(routine_id, id, occasion, recorded_at))
            .collect();
        self.commit(&routine_id, &records, SOME_ALREADY_TAKEN)
            .await?;

        info!(
            routine_id = %routine_id,
            count = records.len(),
            date = %occasion.date(),
            slot = %occasion.slot(),
            "doses recorded"
        );
        Ok(records)
    }
}

#[cfg(test)]
#[path = "taken_service_tests.rs"]
mod tests;
