//! Driving port for the upcoming-doses query.

use async_trait::async_trait;

use crate::domain::{
    DoseSlot, Error, LocalDate, MedicineName, RoutineId, RoutineMedicineId, UserId, Weekday,
};

/// One outstanding dose for the rest of the user's local day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingDose {
    pub routine_id: RoutineId,
    pub routine_name: String,
    pub routine_medicine_id: RoutineMedicineId,
    pub medicine_name: MedicineName,
    pub local_date: LocalDate,
    pub weekday: Weekday,
    pub slot: DoseSlot,
}

/// Domain use-case port for the upcoming-doses query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpcomingDosesQuery: Send + Sync {
    /// Outstanding doses from the current slot to the end of the local day,
    /// ordered by slot, then routine, then entry.
    async fn upcoming(&self, user_id: &UserId) -> Result<Vec<UpcomingDose>, Error>;
}
