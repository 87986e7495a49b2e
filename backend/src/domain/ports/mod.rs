//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, delivery) are implemented by outbound
//! adapters. Driving ports are implemented by domain services and called by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod login_service;
mod medicine_catalogue;
mod medicine_repository;
mod notification_delivery;
mod routine_command;
mod routine_query;
mod routine_repository;
mod taken_command;
mod upcoming_doses_query;
mod user_profile;
mod user_repository;

pub use login_service::{FIXTURE_EMAIL, FixtureLoginService, LoginService};
#[cfg(test)]
pub use medicine_catalogue::MockMedicineCatalogue;
pub use medicine_catalogue::MedicineCatalogue;
#[cfg(test)]
pub use medicine_repository::MockMedicineRepository;
pub use medicine_repository::{MedicineRepository, MedicineRepositoryError};
#[cfg(test)]
pub use notification_delivery::MockNotificationDelivery;
pub use notification_delivery::{
    DeliveryFailure, DeliveryOutcome, DeliveryStatus, NotificationDelivery,
    NotificationDeliveryError, PushNotification,
};
#[cfg(test)]
pub use routine_command::MockRoutineCommand;
pub use routine_command::RoutineCommand;
#[cfg(test)]
pub use routine_query::MockRoutineQuery;
pub use routine_query::RoutineQuery;
#[cfg(test)]
pub use routine_repository::MockRoutineRepository;
pub use routine_repository::{RoutineRepository, RoutineRepositoryError};
#[cfg(test)]
pub use taken_command::MockTakenCommand;
pub use taken_command::{RecordTakenBatchRequest, RecordTakenRequest, TakenCommand};
#[cfg(test)]
pub use upcoming_doses_query::MockUpcomingDosesQuery;
pub use upcoming_doses_query::{UpcomingDose, UpcomingDosesQuery};
#[cfg(test)]
pub use user_profile::MockUserProfile;
pub use user_profile::UserProfile;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
