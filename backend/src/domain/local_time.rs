//! Time-slot resolution in a user's local frame.
//!
//! [`resolve`] turns an instant and an IANA zone name into the local civil
//! date, weekday, and dose slot. The civil date, not the instant, is what
//! "already taken today" is keyed on, so two instants on the same local day
//! always produce equal [`LocalDate`] values, DST transitions included.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::schedule::{DoseSlot, Weekday};

const LOCAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Raised when a time zone identifier is not a known IANA zone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised time zone: {zone}")]
pub struct UnresolvableTimeZone {
    pub zone: String,
}

/// Raised when a date string is not `DD/MM/YYYY`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("date must use the DD/MM/YYYY format: {value}")]
pub struct InvalidLocalDate {
    pub value: String,
}

/// Calendar date in a user's local frame, formatted `DD/MM/YYYY`.
///
/// # Examples
/// ```
/// use medroutines::domain::LocalDate;
///
/// let date: LocalDate = "04/02/2026".parse().unwrap();
/// assert_eq!(date.to_string(), "04/02/2026");
/// assert!("2026-02-04".parse::<LocalDate>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocalDate(NaiveDate);

impl LocalDate {
    pub const fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Civil weekday of the date.
    pub fn weekday(&self) -> Weekday {
        self.0.weekday().into()
    }
}

impl fmt::Display for LocalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(LOCAL_DATE_FORMAT))
    }
}

impl FromStr for LocalDate {
    type Err = InvalidLocalDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidLocalDate {
            value: s.to_owned(),
        };
        // chrono accepts unpadded fields; the wire format is fixed width.
        let [d0, d1, b'/', m0, m1, b'/', y0, y1, y2, y3] = s.as_bytes() else {
            return Err(invalid());
        };
        if ![d0, d1, m0, m1, y0, y1, y2, y3]
            .iter()
            .all(|digit| digit.is_ascii_digit())
        {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(s, LOCAL_DATE_FORMAT)
            .map(Self)
            .map_err(|_| invalid())
    }
}

impl TryFrom<String> for LocalDate {
    type Error = InvalidLocalDate;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LocalDate> for String {
    fn from(value: LocalDate) -> Self {
        value.to_string()
    }
}

/// Local date, weekday, and slot for one user at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSlotContext {
    pub local_date: LocalDate,
    pub weekday: Weekday,
    pub slot: DoseSlot,
    pub local_hour: u32,
}

impl LocalSlotContext {
    /// Index of the current slot within the day.
    pub fn slot_index(&self) -> usize {
        self.slot.index()
    }
}

/// Parse an IANA zone name.
pub fn parse_zone(zone: &str) -> Result<Tz, UnresolvableTimeZone> {
    zone.parse::<Tz>().map_err(|_| UnresolvableTimeZone {
        zone: zone.to_owned(),
    })
}

/// Resolve `now` into the local frame of `zone`.
pub fn resolve(now: DateTime<Utc>, zone: &str) -> Result<LocalSlotContext, UnresolvableTimeZone> {
    let tz = parse_zone(zone)?;
    let local = now.with_timezone(&tz);
    let hour = local.hour();
    Ok(LocalSlotContext {
        local_date: LocalDate(local.date_naive()),
        weekday: local.weekday().into(),
        slot: DoseSlot::for_hour(hour),
        local_hour: hour,
    })
}
