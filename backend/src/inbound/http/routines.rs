//! Routine handlers: create, list, fetch, and today's upcoming doses.
//!
//! ```text
//! POST /api/v1/routines
//! GET  /api/v1/routines
//! GET  /api/v1/routines/upcoming
//! GET  /api/v1/routines/{id}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::domain::ports::UpcomingDose;
use crate::domain::{
    DoseSlot, Error, MedicineId, MedicineKind, MedicineRef, Routine, RoutineEntryRequest,
    RoutineId, RoutineMedicineEntry, RoutineRequest, ScheduleRow, TakenRecord, WeeklySchedule,
    Weekday,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_medicine_kind, require, routine_error, schedule_error,
};

const NAME: FieldName = FieldName::new("name");
const MEDICINES: FieldName = FieldName::new("medicines");
const MEDICINE_TYPE: FieldName = FieldName::new("medicineType");
const MEDICINE_ID: FieldName = FieldName::new("medicineId");
const SCHEDULE: FieldName = FieldName::new("schedule");
const DAY: FieldName = FieldName::new("day");
const TIMES: FieldName = FieldName::new("times");
const ROUTINE_ID: FieldName = FieldName::new("routineId");

/// One `(day, times)` row as sent and returned on the wire.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ScheduleRowDto {
    #[schema(example = "Wednesday")]
    pub day: Option<String>,
    #[schema(example = json!(["Morning", "Evening"]))]
    pub times: Option<Vec<String>>,
}

/// A medicine requested for a new routine.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutineMedicineRequest {
    #[schema(example = "PredefinedMedicine")]
    pub medicine_type: Option<String>,
    pub medicine_id: Option<String>,
    pub schedule: Option<Vec<ScheduleRowDto>>,
}

/// Request body for `POST /api/v1/routines`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateRoutineRequest {
    #[schema(example = "Throat Infection")]
    pub name: Option<String>,
    pub medicines: Option<Vec<RoutineMedicineRequest>>,
}

fn at_entry(err: Error, index: usize) -> Error {
    let mut details = err.details().cloned().unwrap_or_else(|| json!({}));
    if let Value::Object(map) = &mut details {
        map.insert("medicineIndex".to_owned(), json!(index));
    }
    err.with_details(details)
}

fn parse_schedule(rows: Vec<ScheduleRowDto>) -> Result<WeeklySchedule, Error> {
    let rows = rows
        .into_iter()
        .map(|row| {
            let day = require(row.day, DAY)?;
            let times = require(row.times, TIMES)?;
            ScheduleRow::parse(&day, &times).map_err(|err| schedule_error(SCHEDULE, &err))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    WeeklySchedule::new(rows).map_err(|err| schedule_error(SCHEDULE, &err))
}

fn parse_entry(entry: RoutineMedicineRequest) -> Result<RoutineEntryRequest, Error> {
    let kind = parse_medicine_kind(&require(entry.medicine_type, MEDICINE_TYPE)?, MEDICINE_TYPE)?;
    let id: MedicineId = parse_id(&require(entry.medicine_id, MEDICINE_ID)?, MEDICINE_ID)?;
    let schedule = parse_schedule(require(entry.schedule, SCHEDULE)?)?;
    Ok(RoutineEntryRequest {
        medicine: MedicineRef { kind, id },
        schedule,
    })
}

fn parse_create_request(payload: CreateRoutineRequest) -> Result<RoutineRequest, Error> {
    let name = require(payload.name, NAME)?;
    let entries = require(payload.medicines, MEDICINES)?
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(entry).map_err(|err| at_entry(err, index)))
        .collect::<Result<Vec<_>, Error>>()?;
    RoutineRequest::new(name, entries).map_err(|err| routine_error(&err))
}

/// Schedule row in responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct ScheduleRowResponse {
    pub day: Weekday,
    pub times: Vec<DoseSlot>,
}

/// A routine entry in responses.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutineMedicineResponse {
    /// Routine-medicine id used when recording doses.
    pub id: String,
    pub medicine_type: MedicineKind,
    pub medicine_id: String,
    pub medicine_name: String,
    pub schedule: Vec<ScheduleRowResponse>,
}

impl From<&RoutineMedicineEntry> for RoutineMedicineResponse {
    fn from(entry: &RoutineMedicineEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            medicine_type: entry.medicine.kind,
            medicine_id: entry.medicine.id.to_string(),
            medicine_name: entry.medicine_name.to_string(),
            schedule: entry
                .schedule
                .rows()
                .iter()
                .map(|row| ScheduleRowResponse {
                    day: row.day(),
                    times: row.slots().to_vec(),
                })
                .collect(),
        }
    }
}

/// A recorded dose.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TakenResponse {
    pub id: String,
    pub routine_id: String,
    pub routine_medicine_id: String,
    /// Local calendar date, `DD/MM/YYYY`.
    #[schema(example = "21/10/2026")]
    pub date: String,
    pub day: Weekday,
    pub slot: DoseSlot,
    pub recorded_at: String,
}

impl From<&TakenRecord> for TakenResponse {
    fn from(record: &TakenRecord) -> Self {
        Self {
            id: record.id.to_string(),
            routine_id: record.routine_id.to_string(),
            routine_medicine_id: record.routine_medicine_id.to_string(),
            date: record.date.to_string(),
            day: record.day,
            slot: record.slot,
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

/// A routine with resolved medicine names and taken history.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutineResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub medicines: Vec<RoutineMedicineResponse>,
    pub taken: Vec<TakenResponse>,
}

impl From<&Routine> for RoutineResponse {
    fn from(routine: &Routine) -> Self {
        Self {
            id: routine.id().to_string(),
            name: routine.name().to_owned(),
            created_at: routine.created_at().to_rfc3339(),
            medicines: routine
                .entries()
                .iter()
                .map(RoutineMedicineResponse::from)
                .collect(),
            taken: routine.taken().iter().map(TakenResponse::from).collect(),
        }
    }
}

/// `{"routine": ...}` envelope.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RoutineEnvelope {
    pub routine: RoutineResponse,
}

/// `{"routines": [...]}` envelope.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RoutinesEnvelope {
    pub routines: Vec<RoutineResponse>,
}

/// One outstanding dose for today.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDoseResponse {
    pub routine_id: String,
    pub routine_name: String,
    pub routine_medicine_id: String,
    pub medicine_name: String,
    #[schema(example = "21/10/2026")]
    pub local_date: String,
    pub local_day: Weekday,
    pub slot: DoseSlot,
}

impl From<UpcomingDose> for UpcomingDoseResponse {
    fn from(dose: UpcomingDose) -> Self {
        Self {
            routine_id: dose.routine_id.to_string(),
            routine_name: dose.routine_name,
            routine_medicine_id: dose.routine_medicine_id.to_string(),
            medicine_name: dose.medicine_name.into(),
            local_date: dose.local_date.to_string(),
            local_day: dose.weekday,
            slot: dose.slot,
        }
    }
}

/// `{"upcomingDoses": [...]}` envelope.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDosesEnvelope {
    pub upcoming_doses: Vec<UpcomingDoseResponse>,
}

/// Create a routine for the signed-in user.
///
/// Every referenced medicine must exist; otherwise nothing is stored.
#[utoipa::path(
    post,
    path = "/api/v1/routines",
    request_body = CreateRoutineRequest,
    responses(
        (status = 201, description = "Routine created", body = RoutineEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User or medicine not found", body = ErrorSchema),
        (status = 422, description = "Invalid routine", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["routines"],
    operation_id = "createRoutine"
)]
#[post("/routines")]
pub async fn create_routine(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateRoutineRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_create_request(payload.into_inner())?;
    let routine = state.routines.create(&user_id, request).await?;
    Ok(HttpResponse::Created().json(RoutineEnvelope {
        routine: RoutineResponse::from(&routine),
    }))
}

/// List the signed-in user's routines.
#[utoipa::path(
    get,
    path = "/api/v1/routines",
    responses(
        (status = 200, description = "Routines", body = RoutinesEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["routines"],
    operation_id = "listRoutines"
)]
#[get("/routines")]
pub async fn list_routines(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RoutinesEnvelope>> {
    let user_id = session.require_user_id()?;
    let routines = state.routines_query.list(&user_id).await?;
    Ok(web::Json(RoutinesEnvelope {
        routines: routines.iter().map(RoutineResponse::from).collect(),
    }))
}

/// Doses still outstanding today, in the user's local frame.
///
/// Rows are ordered by slot, then routine, then entry order.
#[utoipa::path(
    get,
    path = "/api/v1/routines/upcoming",
    responses(
        (status = 200, description = "Outstanding doses", body = UpcomingDosesEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema),
        (status = 422, description = "User time zone cannot be resolved", body = ErrorSchema)
    ),
    tags = ["routines"],
    operation_id = "upcomingDoses"
)]
#[get("/routines/upcoming")]
pub async fn upcoming_doses(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UpcomingDosesEnvelope>> {
    let user_id = session.require_user_id()?;
    let doses = state.upcoming.upcoming(&user_id).await?;
    Ok(web::Json(UpcomingDosesEnvelope {
        upcoming_doses: doses.into_iter().map(UpcomingDoseResponse::from).collect(),
    }))
}

/// Fetch one of the signed-in user's routines.
#[utoipa::path(
    get,
    path = "/api/v1/routines/{id}",
    params(("id" = String, Path, description = "Routine id")),
    responses(
        (status = 200, description = "Routine", body = RoutineEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Routine not found", body = ErrorSchema),
        (status = 422, description = "Malformed id", body = ErrorSchema)
    ),
    tags = ["routines"],
    operation_id = "getRoutine"
)]
#[get("/routines/{id}")]
pub async fn get_routine(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RoutineEnvelope>> {
    let user_id = session.require_user_id()?;
    let id: RoutineId = parse_id(&path.into_inner(), ROUTINE_ID)?;
    let routine = state.routines_query.get(&user_id, &id).await?;
    Ok(web::Json(RoutineEnvelope {
        routine: RoutineResponse::from(&routine),
    }))
}

#[cfg(test)]
#[path = "routines_tests.rs"]
mod tests;
