//! Session and current-user handlers.
//!
//! ```text
//! POST /api/v1/login {"email":"ada@example.org","password":"password"}
//! POST /api/v1/logout
//! GET  /api/v1/users/me
//! POST /api/v1/users/me/delivery-tokens {"token":"device-token"}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{DeliveryToken, Error, LoginCredentials, LoginValidationError, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, empty_field_error, require};

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: &LoginValidationError) -> Error {
    let (field, code) = match err {
        LoginValidationError::EmptyEmail => ("email", "empty_email"),
        LoginValidationError::InvalidEmail => ("email", "invalid_email"),
        LoginValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Signed-in user as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    /// IANA zone all dose dates and slots are computed in.
    pub time_zone: String,
    pub delivery_token_count: usize,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            time_zone: user.time_zone().to_owned(),
            delivery_token_count: user.delivery_tokens().len(),
        }
    }
}

/// `{"user": ...}` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 422, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserEnvelope>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())
        .map_err(|err| map_login_validation_error(&err))?;
    let user_id = state.login.authenticate(&credentials).await?;
    let user = state.profile.fetch_profile(&user_id).await?;
    session.persist_user(&user_id)?;
    info!(user_id = %user_id, "session established");
    Ok(web::Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Fetch the signed-in user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserEnvelope>> {
    let user_id = session.require_user_id()?;
    let user = state.profile.fetch_profile(&user_id).await?;
    Ok(web::Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// Request body for registering a push delivery token.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DeliveryTokenRequest {
    pub token: Option<String>,
}

/// Outcome of a token registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryTokenResponse {
    /// `false` when the user already held this token.
    pub added: bool,
}

const TOKEN_FIELD: FieldName = FieldName::new("token");

/// Register a push delivery token for the signed-in user.
///
/// Tokens form a set: registering a held token succeeds without change.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/delivery-tokens",
    request_body = DeliveryTokenRequest,
    responses(
        (status = 201, description = "Token added", body = DeliveryTokenResponse),
        (status = 200, description = "Token already registered", body = DeliveryTokenResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema),
        (status = 422, description = "Blank token", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "registerDeliveryToken"
)]
#[post("/users/me/delivery-tokens")]
pub async fn register_delivery_token(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<DeliveryTokenRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let raw = require(payload.into_inner().token, TOKEN_FIELD)?;
    let token = DeliveryToken::new(&raw).map_err(|_| empty_field_error(TOKEN_FIELD))?;
    let added = state.profile.register_delivery_token(&user_id, token).await?;
    let mut response = if added {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(response.json(DeliveryTokenResponse { added }))
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
