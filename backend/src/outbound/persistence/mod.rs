//! PostgreSQL adapters built on Diesel, `diesel-async`, and a `bb8` pool.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) never leave
//! this module; repositories translate them into domain types and map every
//! database failure onto the port's error enum.
//!
//! ```ignore
//! use medroutines::outbound::persistence::{DbPool, DieselRoutineRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/medroutines")).await?;
//! let routines = DieselRoutineRepository::new(pool);
//! ```

mod diesel_medicine_repository;
mod diesel_routine_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_medicine_repository::DieselMedicineRepository;
pub use diesel_routine_repository::DieselRoutineRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
