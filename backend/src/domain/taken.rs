//! Taken records: append-only facts that a scheduled dose was completed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::define_uuid_id;
use super::local_time::LocalDate;
use super::routine::{RoutineId, RoutineMedicineId};
use super::schedule::{DoseSlot, Weekday};

define_uuid_id! {
    /// Identifier of a taken record.
    pub struct TakenId;
}

/// Raised when an occasion's weekday disagrees with its calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMismatch {
    pub date: LocalDate,
    pub day: Weekday,
    pub expected: Weekday,
}

impl fmt::Display for DayMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} falls on a {}, not a {}",
            self.date, self.expected, self.day
        )
    }
}

impl std::error::Error for DayMismatch {}

/// The local date, weekday, and slot a dose belongs to.
///
/// ## Invariants
/// - `day` is the civil weekday of `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoseOccasion {
    date: LocalDate,
    day: Weekday,
    slot: DoseSlot,
}

impl DoseOccasion {
    /// Build an occasion, rejecting a weekday that does not match the date.
    ///
    /// # Examples
    /// ```
    /// use medroutines::domain::{DoseOccasion, DoseSlot, Weekday};
    ///
    /// let date = "21/10/2026".parse().unwrap();
    /// assert!(DoseOccasion::new(date, Weekday::Wednesday, DoseSlot::Morning).is_ok());
    /// assert!(DoseOccasion::new(date, Weekday::Monday, DoseSlot::Morning).is_err());
    /// ```
    pub fn new(date: LocalDate, day: Weekday, slot: DoseSlot) -> Result<Self, DayMismatch> {
        let expected = date.weekday();
        if expected != day {
            return Err(DayMismatch {
                date,
                day,
                expected,
            });
        }
        Ok(Self { date, day, slot })
    }

    pub fn date(&self) -> LocalDate {
        self.date
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    pub fn slot(&self) -> DoseSlot {
        self.slot
    }
}

/// Immutable record that one routine entry's dose was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakenRecord {
    pub id: TakenId,
    pub routine_id: RoutineId,
    pub routine_medicine_id: RoutineMedicineId,
    pub date: LocalDate,
    pub day: Weekday,
    pub slot: DoseSlot,
    pub recorded_at: DateTime<Utc>,
}

impl TakenRecord {
    /// New record for `occasion` with a fresh id.
    pub fn new(
        routine_id: RoutineId,
        routine_medicine_id: RoutineMedicineId,
        occasion: DoseOccasion,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TakenId::random(),
            routine_id,
            routine_medicine_id,
            date: occasion.date,
            day: occasion.day,
            slot: occasion.slot,
            recorded_at,
        }
    }

    /// Whether this record completes the given entry's dose on `date`/`slot`.
    pub fn covers(
        &self,
        routine_medicine_id: RoutineMedicineId,
        day: Weekday,
        slot: DoseSlot,
        date: &LocalDate,
    ) -> bool {
        self.routine_medicine_id == routine_medicine_id
            && self.day == day
            && self.slot == slot
            && &self.date == date
    }

    /// Key that storage keeps unique.
    pub fn uniqueness_key(&self) -> (RoutineId, RoutineMedicineId, LocalDate, DoseSlot) {
        (
            self.routine_id,
            self.routine_medicine_id,
            self.date,
            self.slot,
        )
    }
}
