//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper returns an `invalid_request` domain error whose `details`
//! name the offending field, so clients can highlight it.

use std::str::FromStr;

use serde_json::json;

use crate::domain::{
    DoseSlot, Error, LocalDate, MedicineKind, RoutineValidationError, ScheduleValidationError,
    Weekday,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    EmptyField,
    InvalidUuid,
    InvalidDate,
    InvalidDay,
    InvalidSlot,
    InvalidMedicineType,
    InvalidSchedule,
    DayMismatch,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::EmptyField => "empty_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidDate => "invalid_date",
            Self::InvalidDay => "invalid_day",
            Self::InvalidSlot => "invalid_slot",
            Self::InvalidMedicineType => "invalid_medicine_type",
            Self::InvalidSchedule => "invalid_schedule",
            Self::DayMismatch => "day_mismatch",
        }
    }
}

/// Wire name of a request field, as clients send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn empty_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must not be empty"))
        .with_code(ErrorCode::EmptyField)
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a UUID-backed identifier such as `RoutineId`.
pub(crate) fn parse_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
{
    value.parse().map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be a valid UUID"))
            .with_value(ErrorCode::InvalidUuid, value)
    })
}

pub(crate) fn parse_id_list<T>(values: &[String], field: FieldName) -> Result<Vec<T>, Error>
where
    T: FromStr,
{
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            value.parse().map_err(|_| {
                let name = field.as_str();
                Error::invalid_request(format!("{name} must contain valid UUIDs")).with_details(
                    json!({
                        "field": name,
                        "index": index,
                        "value": value,
                        "code": ErrorCode::InvalidUuid.as_str(),
                    }),
                )
            })
        })
        .collect()
}

/// Parse a `DD/MM/YYYY` local calendar date.
pub(crate) fn parse_local_date(value: &str, field: FieldName) -> Result<LocalDate, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be a DD/MM/YYYY date"))
            .with_value(ErrorCode::InvalidDate, value)
    })
}

pub(crate) fn parse_weekday(value: &str, field: FieldName) -> Result<Weekday, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be a day of the week"))
            .with_value(ErrorCode::InvalidDay, value)
    })
}

pub(crate) fn parse_slot(value: &str, field: FieldName) -> Result<DoseSlot, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        ValidationError::new(
            name,
            format!("{name} must be Morning, Afternoon, Evening, or Night"),
        )
        .with_value(ErrorCode::InvalidSlot, value)
    })
}

pub(crate) fn parse_medicine_kind(value: &str, field: FieldName) -> Result<MedicineKind, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        ValidationError::new(
            name,
            format!("{name} must be PredefinedMedicine or UserDefinedMedicine"),
        )
        .with_value(ErrorCode::InvalidMedicineType, value)
    })
}

pub(crate) fn schedule_error(field: FieldName, err: &ScheduleValidationError) -> Error {
    let code = match err {
        ScheduleValidationError::UnknownDay { .. } => ErrorCode::InvalidDay,
        ScheduleValidationError::UnknownSlot { .. } => ErrorCode::InvalidSlot,
        ScheduleValidationError::EmptySchedule | ScheduleValidationError::EmptySlots { .. } => {
            ErrorCode::InvalidSchedule
        }
    };
    ValidationError::new(field.as_str(), err.to_string()).with_code(code)
}

pub(crate) fn routine_error(err: &RoutineValidationError) -> Error {
    let field = match err {
        RoutineValidationError::EmptyName => "name",
        RoutineValidationError::NoMedicines => "medicines",
    };
    ValidationError::new(field, err.to_string()).with_code(ErrorCode::EmptyField)
}

pub(crate) fn day_mismatch_error(field: FieldName, message: impl Into<String>) -> Error {
    ValidationError::new(field.as_str(), message).with_code(ErrorCode::DayMismatch)
}
