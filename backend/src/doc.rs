//! OpenAPI document for the REST API.
//!
//! [`ApiDoc`] gathers every handler's `utoipa::path` annotation along with
//! the shared error schemas and the session cookie security scheme. Swagger
//! UI serves it in debug builds.

use crate::inbound::http::health::ProbeBody;
use crate::inbound::http::medicines::{
    CreateMedicineRequest, MedicineResponse, PredefinedMedicinesEnvelope,
    UserDefinedMedicineEnvelope, UserDefinedMedicinesEnvelope,
};
use crate::inbound::http::routines::{
    CreateRoutineRequest, RoutineEnvelope, RoutinesEnvelope, UpcomingDosesEnvelope,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::taken::{
    RecordTakenBatchBody, RecordTakenBody, TakenEnvelope, TakensEnvelope,
};
use crate::inbound::http::users::{
    DeliveryTokenRequest, DeliveryTokenResponse, LoginRequest, UserEnvelope,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Medication routines API",
        description = "Weekly medication routines, upcoming doses, and taken records."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::register_delivery_token,
        crate::inbound::http::routines::create_routine,
        crate::inbound::http::routines::list_routines,
        crate::inbound::http::routines::upcoming_doses,
        crate::inbound::http::routines::get_routine,
        crate::inbound::http::taken::record_taken,
        crate::inbound::http::taken::record_taken_multiple,
        crate::inbound::http::medicines::list_predefined,
        crate::inbound::http::medicines::create_user_defined,
        crate::inbound::http::medicines::list_user_defined,
        crate::inbound::http::medicines::delete_user_defined,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        UserEnvelope,
        DeliveryTokenRequest,
        DeliveryTokenResponse,
        CreateRoutineRequest,
        RoutineEnvelope,
        RoutinesEnvelope,
        UpcomingDosesEnvelope,
        RecordTakenBody,
        RecordTakenBatchBody,
        TakenEnvelope,
        TakensEnvelope,
        MedicineResponse,
        CreateMedicineRequest,
        PredefinedMedicinesEnvelope,
        UserDefinedMedicineEnvelope,
        UserDefinedMedicinesEnvelope,
        ProbeBody,
    )),
    tags(
        (name = "users", description = "Session and profile operations"),
        (name = "routines", description = "Weekly routines and upcoming doses"),
        (name = "taken", description = "Recording doses as taken"),
        (name = "medicines", description = "Predefined and user-defined medicines"),
        (name = "health", description = "Orchestration probes")
    )
)]
pub struct ApiDoc;
