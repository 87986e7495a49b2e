//! Medicine catalogue handlers.
//!
//! ```text
//! GET    /api/v1/predefined-medicines
//! POST   /api/v1/user-defined-medicines {"name":"Vitamin D"}
//! GET    /api/v1/user-defined-medicines
//! DELETE /api/v1/user-defined-medicines/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Medicine, MedicineId, MedicineKind, MedicineName};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, empty_field_error, parse_id, require};

const NAME: FieldName = FieldName::new("name");
const ID: FieldName = FieldName::new("id");

/// Medicine from either catalogue.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineResponse {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(example = "Paracetamol")]
    pub name: String,
    pub medicine_type: MedicineKind,
}

impl From<&Medicine> for MedicineResponse {
    fn from(value: &Medicine) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().to_string(),
            medicine_type: value.kind(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedMedicinesEnvelope {
    pub predefined_medicines: Vec<MedicineResponse>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDefinedMedicineEnvelope {
    pub user_defined_medicine: MedicineResponse,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDefinedMedicinesEnvelope {
    pub user_defined_medicines: Vec<MedicineResponse>,
}

/// Request body for `POST /api/v1/user-defined-medicines`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateMedicineRequest {
    #[schema(example = "Vitamin D")]
    pub name: Option<String>,
}

/// List the shared predefined catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/predefined-medicines",
    responses(
        (status = 200, description = "Predefined medicines", body = PredefinedMedicinesEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["medicines"],
    operation_id = "listPredefinedMedicines"
)]
#[get("/predefined-medicines")]
pub async fn list_predefined(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PredefinedMedicinesEnvelope>> {
    session.require_user_id()?;
    let medicines = state.medicines.list_predefined().await?;
    Ok(web::Json(PredefinedMedicinesEnvelope {
        predefined_medicines: medicines.iter().map(MedicineResponse::from).collect(),
    }))
}

/// Create a medicine visible only to the caller.
#[utoipa::path(
    post,
    path = "/api/v1/user-defined-medicines",
    request_body = CreateMedicineRequest,
    responses(
        (status = 201, description = "Medicine created", body = UserDefinedMedicineEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 422, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["medicines"],
    operation_id = "createUserDefinedMedicine"
)]
#[post("/user-defined-medicines")]
pub async fn create_user_defined(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateMedicineRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let raw = require(payload.into_inner().name, NAME)?;
    let name = MedicineName::new(raw).map_err(|_| empty_field_error(NAME))?;
    let medicine = state.medicines.create_user_defined(&user_id, name).await?;
    Ok(HttpResponse::Created().json(UserDefinedMedicineEnvelope {
        user_defined_medicine: MedicineResponse::from(&medicine),
    }))
}

/// List the caller's own medicines.
#[utoipa::path(
    get,
    path = "/api/v1/user-defined-medicines",
    responses(
        (status = 200, description = "User-defined medicines", body = UserDefinedMedicinesEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["medicines"],
    operation_id = "listUserDefinedMedicines"
)]
#[get("/user-defined-medicines")]
pub async fn list_user_defined(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserDefinedMedicinesEnvelope>> {
    let user_id = session.require_user_id()?;
    let medicines = state.medicines.list_user_defined(&user_id).await?;
    Ok(web::Json(UserDefinedMedicinesEnvelope {
        user_defined_medicines: medicines.iter().map(MedicineResponse::from).collect(),
    }))
}

/// Delete one of the caller's medicines.
#[utoipa::path(
    delete,
    path = "/api/v1/user-defined-medicines/{id}",
    params(("id" = String, Path, description = "Medicine id")),
    responses(
        (status = 204, description = "Medicine deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Medicine not found", body = ErrorSchema),
        (status = 409, description = "Medicine used by a routine", body = ErrorSchema),
        (status = 422, description = "Invalid id", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["medicines"],
    operation_id = "deleteUserDefinedMedicine"
)]
#[delete("/user-defined-medicines/{id}")]
pub async fn delete_user_defined(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id: MedicineId = parse_id(&path.into_inner(), ID)?;
    state.medicines.delete_user_defined(&user_id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "medicines_tests.rs"]
mod tests;
