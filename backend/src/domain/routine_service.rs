//! Routine domain services.
//!
//! Creation resolves every medicine reference before anything is written, so
//! a routine naming an unknown medicine leaves no trace in storage.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::medicine_lookup::resolve_medicines;
use crate::domain::ports::{
    MedicineRepository, RoutineCommand, RoutineQuery, RoutineRepository, RoutineRepositoryError,
    UserRepository,
};
use crate::domain::service_support::{map_medicine_error, map_routine_error, map_user_error};
use crate::domain::{
    Error, Routine, RoutineDraft, RoutineId, RoutineMedicineEntry, RoutineMedicineId,
    RoutineRequest, UserId,
};

const USER_NOT_FOUND: &str = "Could not find user for provided id";
const MEDICINES_NOT_FOUND: &str = "Could not find some of the medicines referenced by the routine";
const ROUTINE_NOT_FOUND: &str = "Routine not found.";

/// Routine service implementing the routine command and query ports.
#[derive(Clone)]
pub struct RoutineService<U, M, R> {
    users: Arc<U>,
    medicines: Arc<M>,
    routines: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<U, M, R> RoutineService<U, M, R> {
    /// Create a new service over the user, medicine, and routine repositories.
    pub fn new(users: Arc<U>, medicines: Arc<M>, routines: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            medicines,
            routines,
            clock,
        }
    }
}

impl<U, M, R> RoutineService<U, M, R>
where
    U: UserRepository,
{
    async fn require_user(&self, owner: &UserId) -> Result<(), Error> {
        self.users
            .find_by_id(owner)
            .await
            .map_err(map_user_error)?
            .map(|_| ())
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))
    }
}

#[async_trait]
impl<U, M, R> RoutineCommand for RoutineService<U, M, R>
where
    U: UserRepository,
    M: MedicineRepository,
    R: RoutineRepository,
{
    async fn create(&self, owner: &UserId, request: RoutineRequest) -> Result<Routine, Error> {
        self.require_user(owner).await?;

        let resolved = resolve_medicines(
            self.medicines.as_ref(),
            owner,
            &request.medicine_refs(),
        )
        .await
        .map_err(map_medicine_error)?;
        if !resolved.is_complete() {
            let missing: Vec<_> = resolved
                .missing()
                .iter()
                .map(|reference| {
                    json!({ "medicineType": reference.kind.as_str(), "medicineId": reference.id })
                })
                .collect();
            return Err(Error::not_found(MEDICINES_NOT_FOUND)
                .with_details(json!({ "missing": missing })));
        }

        let mut entries = Vec::with_capacity(request.entries().len());
        for entry in request.entries() {
            let medicine = resolved
                .get(&entry.medicine)
                .ok_or_else(|| Error::not_found(MEDICINES_NOT_FOUND))?;
            entries.push(RoutineMedicineEntry {
                id: RoutineMedicineId::random(),
                medicine: entry.medicine,
                medicine_name: medicine.name().clone(),
                schedule: entry.schedule.clone(),
            });
        }

        let routine = Routine::new(RoutineDraft {
            id: RoutineId::random(),
            owner: owner.clone(),
            name: request.name().to_owned(),
            created_at: self.clock.utc(),
            entries,
            taken: Vec::new(),
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        self.routines
            .create(&routine)
            .await
            .map_err(|err| match err {
                RoutineRepositoryError::MissingMedicine { .. } => {
                    Error::not_found(MEDICINES_NOT_FOUND)
                }
                other => map_routine_error(other),
            })?;

        info!(
            routine_id = %routine.id(),
            user_id = %owner,
            medicines = routine.entries().len(),
            "routine created"
        );
        Ok(routine)
    }
}

#[async_trait]
impl<U, M, R> RoutineQuery for RoutineService<U, M, R>
where
    U: UserRepository,
    M: MedicineRepository,
    R: RoutineRepository,
{
    async fn list(&self, owner: &UserId) -> Result<Vec<Routine>, Error> {
        self.routines
            .list_for_user(owner)
            .await
            .map_err(map_routine_error)
    }

    async fn get(&self, owner: &UserId, id: &RoutineId) -> Result<Routine, Error> {
        self.routines
            .find_for_user(owner, id)
            .await
            .map_err(map_routine_error)?
            .ok_or_else(|| Error::not_found(ROUTINE_NOT_FOUND))
    }
}

#[cfg(test)]
#[path = "routine_service_tests.rs"]
mod tests;
