//! Test utilities for the medroutines crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    DoseSlot, MedicineId, MedicineName, MedicineRef, Routine, RoutineDraft, RoutineId,
    RoutineMedicineEntry, RoutineMedicineId, ScheduleRow, TakenRecord, User, UserDraft, UserId,
    WeeklySchedule, Weekday,
};
use crate::outbound::memory::PREDEFINED_CATALOGUE;

/// Clock whose current instant is set by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.lock_clock() += TimeDelta::minutes(minutes);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// A UTC instant at minute precision.
pub fn utc_instant(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single() {
        Some(instant) => instant,
        None => panic!("invalid instant {year}-{month}-{day} {hour}:{minute}"),
    }
}

/// A user with no delivery tokens.
pub fn sample_user(id: UserId, time_zone: &str) -> User {
    match User::new(UserDraft {
        id,
        name: "Ada Lovelace".to_owned(),
        email: "ada@example.org".to_owned(),
        time_zone: time_zone.to_owned(),
        delivery_tokens: Vec::new(),
        last_reminded_on: None,
    }) {
        Ok(user) => user,
        Err(err) => panic!("sample user: {err}"),
    }
}

/// Schedule listing `slots` on each of `days`.
pub fn on_days(days: &[Weekday], slots: &[DoseSlot]) -> WeeklySchedule {
    let rows = days
        .iter()
        .map(|day| match ScheduleRow::new(*day, slots.to_vec()) {
            Ok(row) => row,
            Err(err) => panic!("schedule row: {err}"),
        })
        .collect();
    match WeeklySchedule::new(rows) {
        Ok(schedule) => schedule,
        Err(err) => panic!("schedule: {err}"),
    }
}

/// Schedule listing `slots` on all seven days.
pub fn every_day(slots: &[DoseSlot]) -> WeeklySchedule {
    on_days(&Weekday::ALL, slots)
}

/// Entry for a predefined medicine with a fresh id.
pub fn sample_entry(name: &str, schedule: WeeklySchedule) -> RoutineMedicineEntry {
    let medicine_name = match MedicineName::new(name) {
        Ok(name) => name,
        Err(err) => panic!("medicine name: {err}"),
    };
    RoutineMedicineEntry {
        id: RoutineMedicineId::random(),
        medicine: MedicineRef::predefined(MedicineId::random()),
        medicine_name,
        schedule,
    }
}

/// Entry for a medicine from the seeded predefined catalogue.
///
/// Routines built from these entries pass the medicine existence check in
/// [`InMemoryStore`](crate::outbound::memory::InMemoryStore).
pub fn catalogue_entry(name: &str, schedule: WeeklySchedule) -> RoutineMedicineEntry {
    let Some((id, _)) = PREDEFINED_CATALOGUE
        .iter()
        .find(|(_, catalogue_name)| *catalogue_name == name)
    else {
        panic!("{name} is not in the predefined catalogue");
    };
    let mut entry = sample_entry(name, schedule);
    entry.medicine = MedicineRef::predefined(MedicineId::from_uuid(*id));
    entry
}

/// Routine with no taken history.
pub fn sample_routine(owner: &UserId, name: &str, entries: Vec<RoutineMedicineEntry>) -> Routine {
    build_routine(RoutineDraft {
        id: RoutineId::random(),
        owner: owner.clone(),
        name: name.to_owned(),
        created_at: utc_instant(2026, 10, 1, 9, 0),
        entries,
        taken: Vec::new(),
    })
}

/// Copy of `routine` whose taken history is `taken`.
pub fn with_taken(routine: &Routine, taken: Vec<TakenRecord>) -> Routine {
    build_routine(RoutineDraft {
        id: routine.id(),
        owner: routine.owner().clone(),
        name: routine.name().to_owned(),
        created_at: routine.created_at(),
        entries: routine.entries().to_vec(),
        taken,
    })
}

fn build_routine(draft: RoutineDraft) -> Routine {
    match Routine::new(draft) {
        Ok(routine) => routine,
        Err(err) => panic!("sample routine: {err}"),
    }
}
