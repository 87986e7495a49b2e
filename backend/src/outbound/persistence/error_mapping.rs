//! Classification of Diesel failures shared by the repositories.
//!
//! Each repository turns a [`DieselFailure`] into its own port error so the
//! constraint names below stay inside the persistence layer.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Unique constraint guarding one taken record per entry, date, and slot.
pub(crate) const TAKEN_ONCE_PER_SLOT: &str = "taken_records_once_per_slot";

/// Database failure reduced to what the repositories act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    Connection(String),
    UniqueViolation { constraint: Option<String> },
    ForeignKeyViolation { constraint: Option<String> },
    Query(String),
}

impl DieselFailure {
    /// Whether a unique violation was raised by `constraint`.
    pub(crate) fn violates_unique(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation { constraint: Some(name) } if name == constraint)
    }

    /// Whether a foreign key violation names a constraint containing `fragment`.
    pub(crate) fn violates_foreign_key(&self, fragment: &str) -> bool {
        matches!(
            self,
            Self::ForeignKeyViolation { constraint: Some(name) } if name.contains(fragment)
        )
    }

    /// Message for errors that carry no domain meaning.
    pub(crate) fn into_message(self) -> String {
        match self {
            Self::Connection(message) | Self::Query(message) => message,
            Self::UniqueViolation { constraint } => {
                format!("unique violation on {}", constraint.as_deref().unwrap_or("unknown"))
            }
            Self::ForeignKeyViolation { constraint } => format!(
                "foreign key violation on {}",
                constraint.as_deref().unwrap_or("unknown")
            ),
        }
    }

    pub(crate) fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Classify a Diesel error, logging the raw detail at debug level.
pub(crate) fn classify(error: DieselError, operation: &str) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        other => debug!(error = %other, %operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DieselFailure::ForeignKeyViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => {
            DieselFailure::Query("database query error".to_owned())
        }
        _ => DieselFailure::Query(format!("{operation} failed")),
    }
}

/// Collect converted rows, stopping at the first row that fails to convert.
pub(crate) fn collect_rows<T, E>(
    rows: impl IntoIterator<Item = Result<T, String>>,
    query: impl Fn(String) -> E,
) -> Result<Vec<T>, E> {
    rows.into_iter().map(|row| row.map_err(&query)).collect()
}
