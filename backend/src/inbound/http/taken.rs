//! Handlers recording doses as taken.
//!
//! ```text
//! POST /api/v1/taken          {"routineId", "routineMedicineId", "date", "day", "slot"}
//! POST /api/v1/taken/multiple {"routineId", "routineMedicineIds", "date", "day", "slot"}
//! ```
//!
//! `date` is the user's local calendar date as `DD/MM/YYYY` and must fall on
//! `day`. A dose is recorded at most once per routine entry, date, and slot;
//! repeats are rejected with `409 Conflict`.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{RecordTakenBatchRequest, RecordTakenRequest};
use crate::domain::{DoseOccasion, Error, RoutineId, RoutineMedicineId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::routines::TakenResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, day_mismatch_error, parse_id, parse_id_list, parse_local_date, parse_slot,
    parse_weekday, require,
};

const ROUTINE_ID: FieldName = FieldName::new("routineId");
const ROUTINE_MEDICINE_ID: FieldName = FieldName::new("routineMedicineId");
const ROUTINE_MEDICINE_IDS: FieldName = FieldName::new("routineMedicineIds");
const DATE: FieldName = FieldName::new("date");
const DAY: FieldName = FieldName::new("day");
const SLOT: FieldName = FieldName::new("slot");

/// Request body for `POST /api/v1/taken`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordTakenBody {
    pub routine_id: Option<String>,
    pub routine_medicine_id: Option<String>,
    #[schema(example = "21/10/2026")]
    pub date: Option<String>,
    #[schema(example = "Wednesday")]
    pub day: Option<String>,
    /// Also accepted as `time`.
    #[serde(alias = "time")]
    #[schema(example = "Morning")]
    pub slot: Option<String>,
}

/// Request body for `POST /api/v1/taken/multiple`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordTakenBatchBody {
    pub routine_id: Option<String>,
    pub routine_medicine_ids: Option<Vec<String>>,
    #[schema(example = "21/10/2026")]
    pub date: Option<String>,
    #[schema(example = "Wednesday")]
    pub day: Option<String>,
    #[serde(alias = "time")]
    #[schema(example = "Morning")]
    pub slot: Option<String>,
}

/// `{"taken": ...}` envelope.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TakenEnvelope {
    pub taken: TakenResponse,
}

/// `{"takens": [...]}` envelope.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TakensEnvelope {
    pub takens: Vec<TakenResponse>,
}

fn parse_occasion(
    date: Option<String>,
    day: Option<String>,
    slot: Option<String>,
) -> Result<DoseOccasion, Error> {
    let date = parse_local_date(&require(date, DATE)?, DATE)?;
    let day = parse_weekday(&require(day, DAY)?, DAY)?;
    let slot = parse_slot(&require(slot, SLOT)?, SLOT)?;
    DoseOccasion::new(date, day, slot).map_err(|err| day_mismatch_error(DAY, err.to_string()))
}

fn parse_single(body: RecordTakenBody) -> Result<RecordTakenRequest, Error> {
    let routine_id: RoutineId = parse_id(&require(body.routine_id, ROUTINE_ID)?, ROUTINE_ID)?;
    let routine_medicine_id: RoutineMedicineId = parse_id(
        &require(body.routine_medicine_id, ROUTINE_MEDICINE_ID)?,
        ROUTINE_MEDICINE_ID,
    )?;
    Ok(RecordTakenRequest {
        routine_id,
        routine_medicine_id,
        occasion: parse_occasion(body.date, body.day, body.slot)?,
    })
}

fn parse_batch(body: RecordTakenBatchBody) -> Result<RecordTakenBatchRequest, Error> {
    let routine_id: RoutineId = parse_id(&require(body.routine_id, ROUTINE_ID)?, ROUTINE_ID)?;
    let raw_ids = require(body.routine_medicine_ids, ROUTINE_MEDICINE_IDS)?;
    let routine_medicine_ids = parse_id_list(&raw_ids, ROUTINE_MEDICINE_IDS)?;
    Ok(RecordTakenBatchRequest {
        routine_id,
        routine_medicine_ids,
        occasion: parse_occasion(body.date, body.day, body.slot)?,
    })
}

/// Record one dose as taken.
#[utoipa::path(
    post,
    path = "/api/v1/taken",
    request_body = RecordTakenBody,
    responses(
        (status = 201, description = "Dose recorded", body = TakenEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Routine or routine medicine not found", body = ErrorSchema),
        (status = 409, description = "Dose already recorded", body = ErrorSchema),
        (status = 422, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["taken"],
    operation_id = "recordTaken"
)]
#[post("/taken")]
pub async fn record_taken(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecordTakenBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_single(payload.into_inner())?;
    let record = state.taken.record(&user_id, request).await?;
    Ok(HttpResponse::Created().json(TakenEnvelope {
        taken: TakenResponse::from(&record),
    }))
}

/// Record several doses of one routine for the same date and slot.
///
/// All-or-nothing: if any id is foreign to the routine or already taken,
/// nothing is recorded.
#[utoipa::path(
    post,
    path = "/api/v1/taken/multiple",
    request_body = RecordTakenBatchBody,
    responses(
        (status = 201, description = "Doses recorded", body = TakensEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Routine or routine medicine not found", body = ErrorSchema),
        (status = 409, description = "A dose was already recorded", body = ErrorSchema),
        (status = 422, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["taken"],
    operation_id = "recordTakenMultiple"
)]
#[post("/taken/multiple")]
pub async fn record_taken_multiple(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecordTakenBatchBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_batch(payload.into_inner())?;
    let records = state.taken.record_multiple(&user_id, request).await?;
    Ok(HttpResponse::Created().json(TakensEnvelope {
        takens: records.iter().map(TakenResponse::from).collect(),
    }))
}

#[cfg(test)]
#[path = "taken_tests.rs"]
mod tests;
