//! Port for the two medicine catalogues.

use async_trait::async_trait;

use crate::domain::{Medicine, MedicineId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by medicine repository adapters.
    pub enum MedicineRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } retryable =>
            "medicine repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "medicine repository query failed: {message}",
        /// The medicine is still referenced by at least one routine.
        InUse { medicine_id: String } =>
            "medicine {medicine_id} is referenced by a routine",
    }
}

/// Read and write access to predefined and user-defined medicines.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MedicineRepository: Send + Sync {
    /// The whole predefined catalogue, ordered by name.
    async fn list_predefined(&self) -> Result<Vec<Medicine>, MedicineRepositoryError>;

    /// Predefined medicines among `ids`; missing ids are simply absent.
    async fn find_predefined(
        &self,
        ids: &[MedicineId],
    ) -> Result<Vec<Medicine>, MedicineRepositoryError>;

    /// User-defined medicines among `ids` that belong to `owner`.
    async fn find_user_defined(
        &self,
        owner: &UserId,
        ids: &[MedicineId],
    ) -> Result<Vec<Medicine>, MedicineRepositoryError>;

    /// All of `owner`'s user-defined medicines, oldest first.
    async fn list_user_defined(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Medicine>, MedicineRepositoryError>;

    /// Persist a new user-defined medicine.
    async fn insert_user_defined(&self, medicine: &Medicine)
    -> Result<(), MedicineRepositoryError>;

    /// Delete one of `owner`'s medicines.
    ///
    /// Returns `false` when no such medicine exists for `owner`. Fails with
    /// [`MedicineRepositoryError::InUse`] while a routine references it.
    async fn delete_user_defined(
        &self,
        owner: &UserId,
        id: &MedicineId,
    ) -> Result<bool, MedicineRepositoryError>;
}
