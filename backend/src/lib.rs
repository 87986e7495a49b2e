//! Medication routines backend.
//!
//! Users keep weekly routines of medicines, each scheduled into time-of-day
//! slots per weekday. The crate answers "what is still due today" in the
//! user's own time zone, records doses as taken at most once, and sweeps
//! users periodically to push reminders for outstanding doses.
//!
//! Layout follows ports and adapters: [`domain`] holds the model, services,
//! and port traits; [`inbound`] exposes the REST API; [`outbound`] implements
//! storage and push delivery.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
