//! Dose reconciliation: which scheduled slots are still outstanding.
//!
//! Everything here is pure over its inputs so the rules can be exercised
//! without storage.

use super::local_time::LocalDate;
use super::routine::RoutineMedicineEntry;
use super::schedule::{DoseSlot, Weekday};
use super::taken::TakenRecord;

/// Outstanding slots for `entry` on `weekday`, at or after `from_slot`.
///
/// A slot is outstanding when the entry is scheduled in it on `weekday` and
/// no record in `taken` covers it on `target_date`. Slots are returned in day
/// order and each appears at most once, even if the schedule repeats the day.
///
/// # Examples
/// ```
/// use medroutines::domain::{
///     outstanding_slots, DoseSlot, MedicineId, MedicineName, MedicineRef,
///     RoutineMedicineEntry, RoutineMedicineId, ScheduleRow, WeeklySchedule, Weekday,
/// };
///
/// let entry = RoutineMedicineEntry {
///     id: RoutineMedicineId::random(),
///     medicine: MedicineRef::predefined(MedicineId::random()),
///     medicine_name: MedicineName::new("Ibuprofen").unwrap(),
///     schedule: WeeklySchedule::new(vec![ScheduleRow::new(
///         Weekday::Wednesday,
///         vec![DoseSlot::Morning, DoseSlot::Evening],
///     )
///     .unwrap()])
///     .unwrap(),
/// };
/// let today = "21/10/2026".parse().unwrap();
/// let due = outstanding_slots(&entry, Weekday::Wednesday, 1, &[], &today);
/// assert_eq!(due, vec![DoseSlot::Evening]);
/// ```
pub fn outstanding_slots(
    entry: &RoutineMedicineEntry,
    weekday: Weekday,
    from_slot: usize,
    taken: &[TakenRecord],
    target_date: &LocalDate,
) -> Vec<DoseSlot> {
    entry
        .schedule
        .slots_on(weekday)
        .into_iter()
        .filter(|slot| slot.index() >= from_slot)
        .filter(|slot| {
            !taken
                .iter()
                .any(|record| record.covers(entry.id, weekday, *slot, target_date))
        })
        .collect()
}

/// Whether `entry` has any untaken dose on `weekday`, regardless of slot.
pub fn has_outstanding_dose(
    entry: &RoutineMedicineEntry,
    weekday: Weekday,
    taken: &[TakenRecord],
    target_date: &LocalDate,
) -> bool {
    !outstanding_slots(entry, weekday, 0, taken, target_date).is_empty()
}
