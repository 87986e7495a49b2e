//! Shared mapping from driven-port errors to domain errors.
//!
//! Dependency failures are logged with their detail and surfaced to callers
//! as generic "try again" errors.

use tracing::error;

use crate::domain::Error;
use crate::domain::ports::{
    MedicineRepositoryError, RoutineRepositoryError, UserPersistenceError,
};

const TRY_AGAIN: &str = "Service temporarily unavailable, please try again.";
const UNEXPECTED: &str = "Something went wrong, please try again.";

fn unavailable(source: &str, message: &str) -> Error {
    error!(source, %message, "storage connection failed");
    Error::service_unavailable(TRY_AGAIN)
}

fn failed(source: &str, message: &str) -> Error {
    error!(source, %message, "storage operation failed");
    Error::internal(UNEXPECTED)
}

pub(crate) fn map_user_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => unavailable("users", &message),
        UserPersistenceError::Query { message } => failed("users", &message),
    }
}

/// Maps the generic variants; callers translate `InUse` themselves.
pub(crate) fn map_medicine_error(err: MedicineRepositoryError) -> Error {
    match err {
        MedicineRepositoryError::Connection { message } => unavailable("medicines", &message),
        MedicineRepositoryError::Query { message } => failed("medicines", &message),
        MedicineRepositoryError::InUse { medicine_id } => {
            Error::conflict("Medicine is used by a routine and cannot be deleted.")
                .with_details(serde_json::json!({ "medicineId": medicine_id }))
        }
    }
}

/// Maps the generic variants; services handle the domain-specific ones first.
pub(crate) fn map_routine_error(err: RoutineRepositoryError) -> Error {
    match err {
        RoutineRepositoryError::Connection { message } => unavailable("routines", &message),
        RoutineRepositoryError::Query { message } => failed("routines", &message),
        RoutineRepositoryError::MissingMedicine { message } => {
            Error::not_found("Could not find some of the medicines referenced by the routine")
                .with_details(serde_json::json!({ "reason": message }))
        }
        RoutineRepositoryError::RoutineMissing { .. } => Error::not_found("Routine not found."),
        RoutineRepositoryError::DuplicateTaken { .. } => {
            Error::conflict("Medicine already marked as taken for this slot.")
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
    fn user_errors_hide_detail(#[case] err: UserPersistenceError, #[case] code: ErrorCode) {
        let mapped = map_user_error(err);
        assert_eq!(mapped.code(), code);
        assert!(!mapped.message().contains("refused"));
        assert!(!mapped.message().contains("syntax"));
    }

    #[rstest]
    #[case(RoutineRepositoryError::routine_missing("r"), ErrorCode::NotFound)]
    #[case(RoutineRepositoryError::duplicate_taken("e"), ErrorCode::Conflict)]
    #[case(RoutineRepositoryError::missing_medicine("m"), ErrorCode::NotFound)]
    #[case(RoutineRepositoryError::connection("c"), ErrorCode::ServiceUnavailable)]
    fn routine_errors_map_to_codes(#[case] err: RoutineRepositoryError, #[case] code: ErrorCode) {
        assert_eq!(map_routine_error(err).code(), code);
    }

    #[rstest]
    fn medicine_in_use_is_conflict() {
        let mapped = map_medicine_error(MedicineRepositoryError::in_use("abc"));
        assert_eq!(mapped.code(), ErrorCode::Conflict);
    }
}
