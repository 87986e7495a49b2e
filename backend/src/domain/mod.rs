//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed medication-routine entities, the pure
//! scheduling and reconciliation rules, and the services that implement the
//! driving ports. Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload.
//! - Schedule model: [`Weekday`], [`DoseSlot`], [`WeeklySchedule`], [`Routine`].
//! - Engines: [`local_time::resolve`], [`outstanding_slots`].
//! - Services: routine, taken, upcoming doses, medicines, profile, reminder sweep.

pub mod auth;
pub mod error;
mod ids;
pub mod local_time;
pub mod medicine;
pub mod medicine_lookup;
pub mod medicine_service;
pub mod ports;
pub mod reconciliation;
pub mod reminder_sweep;
pub mod routine;
pub mod routine_service;
pub mod schedule;
mod service_support;
pub mod taken;
pub mod taken_service;
pub mod trace_id;
pub mod upcoming_doses_service;
pub mod user;
pub mod user_profile_service;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{Error, ErrorCode};
pub use self::local_time::{
    InvalidLocalDate, LocalDate, LocalSlotContext, UnresolvableTimeZone,
};
pub use self::medicine::{
    EmptyMedicineName, Medicine, MedicineId, MedicineKind, MedicineName, MedicineRef,
    UnknownMedicineKind,
};
pub use self::medicine_lookup::{ResolvedMedicines, resolve_medicines};
pub use self::medicine_service::MedicineService;
pub use self::reconciliation::{has_outstanding_dose, outstanding_slots};
pub use self::reminder_sweep::{
    ReminderScheduler, ReminderSweep, ReminderSweepConfig, ReminderSweepPorts, ScheduledSweep,
    SweepReport, UserSweepOutcome,
};
pub use self::routine::{
    Routine, RoutineDraft, RoutineEntryRequest, RoutineId, RoutineMedicineEntry,
    RoutineMedicineId, RoutineRequest, RoutineValidationError,
};
pub use self::routine_service::RoutineService;
pub use self::schedule::{DoseSlot, ScheduleRow, ScheduleValidationError, WeeklySchedule, Weekday};
pub use self::taken::{DayMismatch, DoseOccasion, TakenId, TakenRecord};
pub use self::taken_service::TakenService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::upcoming_doses_service::{UpcomingDosesService, upcoming_doses};
pub use self::user::{DeliveryToken, User, UserDraft, UserId, UserValidationError};
pub use self::user_profile_service::UserProfileService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use medroutines::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
