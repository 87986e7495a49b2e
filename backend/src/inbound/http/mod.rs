//! HTTP inbound adapter exposing the REST endpoints.
//!
//! Handlers translate JSON bodies into domain requests, call the driving
//! ports held in [`state::HttpState`], and map domain errors onto status
//! codes in [`error`].

pub mod error;
pub mod health;
pub mod medicines;
pub mod routines;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
pub mod taken;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// `/routines/upcoming` is registered ahead of `/routines/{id}` so the
/// literal segment wins.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(users::login)
        .service(users::logout)
        .service(users::current_user)
        .service(users::register_delivery_token)
        .service(routines::create_routine)
        .service(routines::list_routines)
        .service(routines::upcoming_doses)
        .service(routines::get_routine)
        .service(taken::record_taken)
        .service(taken::record_taken_multiple)
        .service(medicines::list_predefined)
        .service(medicines::create_user_defined)
        .service(medicines::list_user_defined)
        .service(medicines::delete_user_defined);
}

/// JSON extractor config that reports malformed bodies as domain errors.
pub fn api_json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(error::json_error_handler)
}
