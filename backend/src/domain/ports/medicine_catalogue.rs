//! Driving port for browsing and managing medicines.

use async_trait::async_trait;

use crate::domain::{Error, Medicine, MedicineId, MedicineName, UserId};

/// Domain use-case port for the medicine catalogues.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MedicineCatalogue: Send + Sync {
    /// The shared predefined catalogue.
    async fn list_predefined(&self) -> Result<Vec<Medicine>, Error>;

    /// Create a medicine owned by `owner`.
    async fn create_user_defined(
        &self,
        owner: &UserId,
        name: MedicineName,
    ) -> Result<Medicine, Error>;

    /// `owner`'s own medicines.
    async fn list_user_defined(&self, owner: &UserId) -> Result<Vec<Medicine>, Error>;

    /// Delete one of `owner`'s medicines; `conflict` while a routine uses it.
    async fn delete_user_defined(&self, owner: &UserId, id: &MedicineId) -> Result<(), Error>;
}
