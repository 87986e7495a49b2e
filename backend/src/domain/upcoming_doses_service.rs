//! Upcoming-doses query service.
//!
//! Rows are emitted slot by slot from the user's current local slot to the
//! end of the local day. Within a slot, routines keep their stored order and
//! entries keep their order inside the routine.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::debug;

use crate::domain::local_time::{LocalSlotContext, resolve};
use crate::domain::ports::{RoutineRepository, UpcomingDose, UpcomingDosesQuery, UserRepository};
use crate::domain::reconciliation::outstanding_slots;
use crate::domain::service_support::{map_routine_error, map_user_error};
use crate::domain::{DoseSlot, Error, Routine, UserId};

const USER_NOT_FOUND: &str = "Could not find user for provided id";

/// Service implementing [`UpcomingDosesQuery`].
#[derive(Clone)]
pub struct UpcomingDosesService<U, R> {
    users: Arc<U>,
    routines: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<U, R> UpcomingDosesService<U, R> {
    pub fn new(users: Arc<U>, routines: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            routines,
            clock,
        }
    }
}

/// Outstanding doses across `routines` from `context`'s slot onwards.
pub fn upcoming_doses(routines: &[Routine], context: &LocalSlotContext) -> Vec<UpcomingDose> {
    // Outstanding slots per (routine, entry), computed once.
    let outstanding: Vec<Vec<Vec<DoseSlot>>> = routines
        .iter()
        .map(|routine| {
            routine
                .entries()
                .iter()
                .map(|entry| {
                    outstanding_slots(
                        entry,
                        context.weekday,
                        context.slot_index(),
                        routine.taken(),
                        &context.local_date,
                    )
                })
                .collect()
        })
        .collect();

    let mut rows = Vec::new();
    for slot in DoseSlot::ALL.into_iter().skip(context.slot_index()) {
        for (routine, per_entry) in routines.iter().zip(&outstanding) {
            for (entry, slots) in routine.entries().iter().zip(per_entry) {
                if slots.contains(&slot) {
                    rows.push(UpcomingDose {
                        routine_id: routine.id(),
                        routine_name: routine.name().to_owned(),
                        routine_medicine_id: entry.id,
                        medicine_name: entry.medicine_name.clone(),
                        local_date: context.local_date,
                        weekday: context.weekday,
                        slot,
                    });
                }
            }
        }
    }
    rows
}

#[async_trait]
impl<U, R> UpcomingDosesQuery for UpcomingDosesService<U, R>
where
    U: UserRepository,
    R: RoutineRepository,
{
    async fn upcoming(&self, user_id: &UserId) -> Result<Vec<UpcomingDose>, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))?;

        let context = resolve(self.clock.utc(), user.time_zone()).map_err(|err| {
            Error::invalid_request("Could not resolve the user's time zone.").with_details(json!({
                "code": "unresolvable_time_zone",
                "timeZone": err.zone,
            }))
        })?;

        let routines = self
            .routines
            .list_for_user(user_id)
            .await
            .map_err(map_routine_error)?;

        let rows = upcoming_doses(&routines, &context);
        debug!(
            user_id = %user_id,
            local_date = %context.local_date,
            slot = %context.slot,
            rows = rows.len(),
            "upcoming doses resolved"
        );
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "upcoming_doses_service_tests.rs"]
mod tests;
