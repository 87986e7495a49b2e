//! Tests for session and current-user handlers.

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::FIXTURE_EMAIL;
use crate::inbound::http::test_utils::{TestBackend, api_app, session_cookie};
use crate::test_support::utc_instant;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::Value;

async fn backend() -> TestBackend {
    TestBackend::new(utc_instant(2026, 10, 21, 9, 0), "Europe/London").await
}

fn login_request(email: &str, password: &str) -> actix_http::Request {
    actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(&LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        })
        .to_request()
}

#[actix_web::test]
async fn login_sets_a_session_and_returns_the_user() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;

    let res = actix_test::call_service(&app, login_request(FIXTURE_EMAIL, "password")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res).expect("session cookie");
    let body: UserEnvelope = actix_test::read_body_json(res).await;
    assert_eq!(body.user.email, FIXTURE_EMAIL);
    assert_eq!(body.user.time_zone, "Europe/London");

    let me = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(me.status(), StatusCode::OK);
}

#[actix_web::test]
async fn wrong_password_is_unauthorised() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;

    let res = actix_test::call_service(&app, login_request(FIXTURE_EMAIL, "hunter2")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&res).is_none());
}

#[rstest]
#[case("   ", "password", "email", "empty_email")]
#[case("ada", "password", "email", "invalid_email")]
#[case(FIXTURE_EMAIL, "", "password", "empty_password")]
#[actix_web::test]
async fn login_validation_errors_name_the_field(
    #[case] email: &str,
    #[case] password: &str,
    #[case] field: &str,
    #[case] code: &str,
) {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;

    let res = actix_test::call_service(&app, login_request(email, password)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["field"], field);
    assert_eq!(body["details"]["code"], code);
}

#[actix_web::test]
async fn current_user_requires_a_session() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Error = actix_test::read_body_json(res).await;
    assert_eq!(body.code(), ErrorCode::Unauthorized);
}

#[actix_web::test]
async fn logout_ends_the_session() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let login_res = actix_test::call_service(&app, login_request(FIXTURE_EMAIL, "password")).await;
    let cookie = session_cookie(&login_res).expect("session cookie");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cleared = session_cookie(&res).expect("expired cookie");

    let me = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cleared)
            .to_request(),
    )
    .await;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn delivery_tokens_behave_as_a_set() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let login_res = actix_test::call_service(&app, login_request(FIXTURE_EMAIL, "password")).await;
    let cookie = session_cookie(&login_res).expect("session cookie");

    let register = || {
        actix_test::TestRequest::post()
            .uri("/api/v1/users/me/delivery-tokens")
            .cookie(cookie.clone())
            .set_json(json!({ "token": "device-a" }))
            .to_request()
    };

    let first = actix_test::call_service(&app, register()).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = actix_test::call_service(&app, register()).await;
    assert_eq!(second.status(), StatusCode::OK);
    let body: DeliveryTokenResponse = actix_test::read_body_json(second).await;
    assert!(!body.added);

    let me = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: UserEnvelope = actix_test::read_body_json(me).await;
    assert_eq!(body.user.delivery_token_count, 1);
}

#[rstest]
#[case(json!({ "token": "   " }))]
#[case(json!({}))]
#[actix_web::test]
async fn blank_or_missing_tokens_are_rejected(#[case] payload: Value) {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let login_res = actix_test::call_service(&app, login_request(FIXTURE_EMAIL, "password")).await;
    let cookie = session_cookie(&login_res).expect("session cookie");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/users/me/delivery-tokens")
            .cookie(cookie)
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
