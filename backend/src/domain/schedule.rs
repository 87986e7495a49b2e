//! Weekly recurring schedule model: weekdays, coarse dose slots, and the
//! per-entry schedule rows that pair them.
//!
//! Wire names follow the English weekday and slot names (`"Monday"`,
//! `"Morning"`). Unknown names are rejected here, at the boundary, so the
//! reconciliation engine only ever sees valid values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation errors raised while building a [`WeeklySchedule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleValidationError {
    /// The day name is not one of the seven weekdays.
    UnknownDay { value: String },
    /// The slot name is not one of the four dose slots.
    UnknownSlot { value: String },
    /// The schedule has no rows.
    EmptySchedule,
    /// A row names a day but no slots.
    EmptySlots { day: Weekday },
}

impl fmt::Display for ScheduleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownDay { value } => write!(f, "unknown day of week: {value}"),
            Self::UnknownSlot { value } => write!(f, "unknown dose slot: {value}"),
            Self::EmptySchedule => write!(f, "schedule must contain at least one day"),
            Self::EmptySlots { day } => write!(f, "schedule for {day} must list at least one slot"),
        }
    }
}

impl std::error::Error for ScheduleValidationError {}

/// Civil day of the week.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Wire name of the weekday.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        match value {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ScheduleValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == s)
            .ok_or_else(|| ScheduleValidationError::UnknownDay {
                value: s.to_owned(),
            })
    }
}

/// Coarse time-of-day bucket a dose is scheduled in.
///
/// Variant order is the order slots occur in a day; [`DoseSlot::index`]
/// exposes it as `0..=3`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum DoseSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DoseSlot {
    /// All slots in day order.
    pub const ALL: [DoseSlot; 4] = [
        DoseSlot::Morning,
        DoseSlot::Afternoon,
        DoseSlot::Evening,
        DoseSlot::Night,
    ];

    /// Zero-based position of the slot within the day.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Slot at the given position, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Slot covering a local clock hour.
    ///
    /// Hours 0-11 are Morning, 12-16 Afternoon, 17-20 Evening and 21-23
    /// Night. Out-of-range hours clamp to Night.
    pub const fn for_hour(hour: u32) -> Self {
        match hour {
            0..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Wire name of the slot.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

impl fmt::Display for DoseSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseSlot {
    type Err = ScheduleValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| ScheduleValidationError::UnknownSlot {
                value: s.to_owned(),
            })
    }
}

/// One `(day, slots)` pair of a weekly schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    day: Weekday,
    slots: Vec<DoseSlot>,
}

impl ScheduleRow {
    /// Build a row; at least one slot is required.
    pub fn new(day: Weekday, slots: Vec<DoseSlot>) -> Result<Self, ScheduleValidationError> {
        if slots.is_empty() {
            return Err(ScheduleValidationError::EmptySlots { day });
        }
        Ok(Self { day, slots })
    }

    /// Build a row from wire names.
    pub fn parse<S: AsRef<str>>(day: &str, slots: &[S]) -> Result<Self, ScheduleValidationError> {
        let day = day.parse()?;
        let slots = slots
            .iter()
            .map(|slot| slot.as_ref().parse())
            .collect::<Result<Vec<DoseSlot>, _>>()?;
        Self::new(day, slots)
    }

    pub fn day(&self) -> Weekday {
        self.day
    }

    /// Slots exactly as submitted.
    pub fn slots(&self) -> &[DoseSlot] {
        &self.slots
    }
}

/// Weekly schedule for a single routine entry.
///
/// Rows are kept as submitted so a fetched routine reproduces its input.
/// Repeated days are tolerated: [`WeeklySchedule::slots_on`] unions them.
///
/// # Examples
/// ```
/// use medroutines::domain::{DoseSlot, ScheduleRow, WeeklySchedule, Weekday};
///
/// let schedule = WeeklySchedule::new(vec![
///     ScheduleRow::new(Weekday::Monday, vec![DoseSlot::Evening]).unwrap(),
///     ScheduleRow::new(Weekday::Monday, vec![DoseSlot::Morning]).unwrap(),
/// ])
/// .unwrap();
/// assert_eq!(
///     schedule.slots_on(Weekday::Monday),
///     vec![DoseSlot::Morning, DoseSlot::Evening]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    rows: Vec<ScheduleRow>,
}

impl WeeklySchedule {
    /// Build a schedule; at least one row is required.
    pub fn new(rows: Vec<ScheduleRow>) -> Result<Self, ScheduleValidationError> {
        if rows.is_empty() {
            return Err(ScheduleValidationError::EmptySchedule);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    /// Distinct slots scheduled on `day`, in day order.
    pub fn slots_on(&self, day: Weekday) -> Vec<DoseSlot> {
        let mut scheduled = [false; DoseSlot::ALL.len()];
        for row in self.rows.iter().filter(|row| row.day == day) {
            for slot in &row.slots {
                scheduled[slot.index()] = true;
            }
        }
        DoseSlot::ALL
            .into_iter()
            .filter(|slot| scheduled[slot.index()])
            .collect()
    }

    /// Whether any row names `day`.
    pub fn is_scheduled_on(&self, day: Weekday) -> bool {
        self.rows.iter().any(|row| row.day == day)
    }
}
