//! Medicine catalogue service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{MedicineCatalogue, MedicineRepository};
use crate::domain::service_support::map_medicine_error;
use crate::domain::{Error, Medicine, MedicineId, MedicineName, UserId};

/// Service implementing [`MedicineCatalogue`].
#[derive(Clone)]
pub struct MedicineService<M> {
    medicines: Arc<M>,
}

impl<M> MedicineService<M> {
    pub fn new(medicines: Arc<M>) -> Self {
        Self { medicines }
    }
}

#[async_trait]
impl<M> MedicineCatalogue for MedicineService<M>
where
    M: MedicineRepository,
{
    async fn list_predefined(&self) -> Result<Vec<Medicine>, Error> {
        self.medicines
            .list_predefined()
            .await
            .map_err(map_medicine_error)
    }

    async fn create_user_defined(
        &self,
        owner: &UserId,
        name: MedicineName,
    ) -> Result<Medicine, Error> {
        let medicine = Medicine::user_defined(MedicineId::random(), name, owner.clone());
        self.medicines
            .insert_user_defined(&medicine)
            .await
            .map_err(map_medicine_error)?;
        info!(medicine_id = %medicine.id(), user_id = %owner, "user-defined medicine created");
        Ok(medicine)
    }

    async fn list_user_defined(&self, owner: &UserId) -> Result<Vec<Medicine>, Error> {
        self.medicines
            .list_user_defined(owner)
            .await
            .map_err(map_medicine_error)
    }

    async fn delete_user_defined(&self, owner: &UserId, id: &MedicineId) -> Result<(), Error> {
        let deleted = self
            .medicines
            .delete_user_defined(owner, id)
            .await
            .map_err(map_medicine_error)?;
        if !deleted {
            return Err(Error::not_found("Medicine not found."));
        }
        info!(medicine_id = %id, user_id = %owner, "user-defined medicine deleted");
        Ok(())
    }
}
