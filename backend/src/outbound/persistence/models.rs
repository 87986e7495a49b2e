//! Diesel row structs. Internal to the persistence layer.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    predefined_medicines, routine_medicines, routines, taken_records, user_defined_medicines,
    user_delivery_tokens, users,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub time_zone: String,
    pub last_reminded_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserUpsertRow<'a> {
    pub id: Uuid,
    pub display_name: &'a str,
    pub email: &'a str,
    pub time_zone: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_delivery_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeliveryTokenRow {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_delivery_tokens)]
pub(crate) struct NewDeliveryTokenRow<'a> {
    pub user_id: Uuid,
    pub token: &'a str,
}

// ---------------------------------------------------------------------------
// Medicines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = predefined_medicines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PredefinedMedicineRow {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_defined_medicines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserDefinedMedicineRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_defined_medicines)]
pub(crate) struct NewUserDefinedMedicineRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: &'a str,
}

// ---------------------------------------------------------------------------
// Routines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RoutineRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routines)]
pub(crate) struct NewRoutineRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: &'a str,
    pub taken_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Entry row joined with whichever catalogue name applies.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct RoutineMedicineRow {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub medicine_kind: String,
    pub predefined_medicine_id: Option<Uuid>,
    pub user_defined_medicine_id: Option<Uuid>,
    pub schedule: serde_json::Value,
    pub predefined_name: Option<String>,
    pub user_defined_name: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routine_medicines)]
pub(crate) struct NewRoutineMedicineRow<'a> {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub position: i32,
    pub medicine_kind: &'a str,
    pub predefined_medicine_id: Option<Uuid>,
    pub user_defined_medicine_id: Option<Uuid>,
    pub schedule: serde_json::Value,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = taken_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TakenRecordRow {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub routine_medicine_id: Uuid,
    pub local_date: NaiveDate,
    pub weekday: String,
    pub slot: String,
    pub recorded_at: DateTime<Utc>,
}
