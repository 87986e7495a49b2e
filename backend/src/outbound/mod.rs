//! Outbound adapters implementing the domain's driven ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel
//! - **memory**: a mutex-guarded store used when no database is configured
//! - **delivery**: HTTP push notification delivery
//!
//! Adapters translate between domain types and their storage or wire
//! representation and hold no business rules.

pub mod delivery;
pub mod memory;
pub mod persistence;
