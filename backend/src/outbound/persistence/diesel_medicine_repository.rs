//! PostgreSQL-backed `MedicineRepository` over the two catalogue tables.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{MedicineRepository, MedicineRepositoryError};
use crate::domain::{Medicine, MedicineId, MedicineName, UserId};

use super::error_mapping::{DieselFailure, classify, collect_rows};
use super::models::{NewUserDefinedMedicineRow, PredefinedMedicineRow, UserDefinedMedicineRow};
use super::pool::{DbPool, PoolError};
use super::schema::{predefined_medicines, user_defined_medicines};

/// Diesel-backed medicine catalogues.
#[derive(Clone)]
pub struct DieselMedicineRepository {
    pool: DbPool,
}

impl DieselMedicineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MedicineRepositoryError {
    MedicineRepositoryError::connection(error.into_message())
}

fn map_failure(failure: DieselFailure) -> MedicineRepositoryError {
    if failure.is_connection() {
        MedicineRepositoryError::connection(failure.into_message())
    } else {
        MedicineRepositoryError::query(failure.into_message())
    }
}

fn map_diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> MedicineRepositoryError {
    move |error| map_failure(classify(error, operation))
}

fn predefined_row_to_medicine(row: PredefinedMedicineRow) -> Result<Medicine, String> {
    let name = MedicineName::new(&row.name)
        .map_err(|err| format!("corrupted predefined medicine {}: {err}", row.id))?;
    Ok(Medicine::predefined(MedicineId::from_uuid(row.id), name))
}

fn user_defined_row_to_medicine(row: UserDefinedMedicineRow) -> Result<Medicine, String> {
    let name = MedicineName::new(&row.name)
        .map_err(|err| format!("corrupted user-defined medicine {}: {err}", row.id))?;
    Ok(Medicine::user_defined(
        MedicineId::from_uuid(row.id),
        name,
        UserId::from_uuid(row.owner_id),
    ))
}

fn raw_ids(ids: &[MedicineId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

#[async_trait]
impl MedicineRepository for DieselMedicineRepository {
    async fn list_predefined(&self) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PredefinedMedicineRow> = predefined_medicines::table
            .order_by(predefined_medicines::name)
            .select(PredefinedMedicineRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list predefined medicines"))?;
        collect_rows(
            rows.into_iter().map(predefined_row_to_medicine),
            MedicineRepositoryError::query,
        )
    }

    async fn find_predefined(
        &self,
        ids: &[MedicineId],
    ) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PredefinedMedicineRow> = predefined_medicines::table
            .filter(predefined_medicines::id.eq_any(raw_ids(ids)))
            .select(PredefinedMedicineRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("find predefined medicines"))?;
        collect_rows(
            rows.into_iter().map(predefined_row_to_medicine),
            MedicineRepositoryError::query,
        )
    }

    async fn find_user_defined(
        &self,
        owner: &UserId,
        ids: &[MedicineId],
    ) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserDefinedMedicineRow> = user_defined_medicines::table
            .filter(user_defined_medicines::owner_id.eq(owner.as_uuid()))
            .filter(user_defined_medicines::id.eq_any(raw_ids(ids)))
            .select(UserDefinedMedicineRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("find user-defined medicines"))?;
        collect_rows(
            rows.into_iter().map(user_defined_row_to_medicine),
            MedicineRepositoryError::query,
        )
    }

    async fn list_user_defined(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserDefinedMedicineRow> = user_defined_medicines::table
            .filter(user_defined_medicines::owner_id.eq(owner.as_uuid()))
            .order_by((user_defined_medicines::created_at, user_defined_medicines::id))
            .select(UserDefinedMedicineRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list user-defined medicines"))?;
        collect_rows(
            rows.into_iter().map(user_defined_row_to_medicine),
            MedicineRepositoryError::query,
        )
    }

    async fn insert_user_defined(
        &self,
        medicine: &Medicine,
    ) -> Result<(), MedicineRepositoryError> {
        let Some(owner) = medicine.owner() else {
            return Err(MedicineRepositoryError::query(
                "user-defined medicine requires an owner",
            ));
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(user_defined_medicines::table)
            .values(NewUserDefinedMedicineRow {
                id: *medicine.id().as_uuid(),
                owner_id: *owner.as_uuid(),
                name: medicine.name().as_ref(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error("insert user-defined medicine"))?;
        Ok(())
    }

    async fn delete_user_defined(
        &self,
        owner: &UserId,
        id: &MedicineId,
    ) -> Result<bool, MedicineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            user_defined_medicines::table
                .filter(user_defined_medicines::owner_id.eq(owner.as_uuid()))
                .filter(user_defined_medicines::id.eq(id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(|error| {
            let failure = classify(error, "delete user-defined medicine");
            if failure.violates_foreign_key("user_defined_medicine_id") {
                MedicineRepositoryError::in_use(id.to_string())
            } else {
                map_failure(failure)
            }
        })?;
        Ok(deleted > 0)
    }
}
