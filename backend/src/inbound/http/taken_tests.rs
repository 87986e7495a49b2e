//! Tests for taken-recording handlers.

use super::*;
use crate::domain::DoseSlot;
use crate::inbound::http::routines::{RoutineEnvelope, UpcomingDosesEnvelope};
use crate::inbound::http::test_utils::{TestBackend, api_app, sign_in};
use crate::outbound::memory::PREDEFINED_CATALOGUE;
use crate::test_support::utc_instant;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

const WEDNESDAY: &str = "21/10/2026";

/// Wednesday 21/10/2026 at 10:00 in London.
async fn backend() -> TestBackend {
    TestBackend::new(utc_instant(2026, 10, 21, 9, 0), "Europe/London").await
}

async fn create_routine<S>(app: &S, cookie: &Cookie<'static>) -> RoutineEnvelope
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let all_day = ["Morning", "Afternoon", "Evening"];
    let schedule: Vec<Value> = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ]
    .iter()
    .map(|day| json!({ "day": day, "times": all_day }))
    .collect();
    let payload = json!({
        "name": "Throat Infection",
        "medicines": [
            {
                "medicineType": "PredefinedMedicine",
                "medicineId": PREDEFINED_CATALOGUE[5].0.to_string(),
                "schedule": schedule
            },
            {
                "medicineType": "PredefinedMedicine",
                "medicineId": PREDEFINED_CATALOGUE[2].0.to_string(),
                "schedule": schedule
            }
        ]
    });
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/routines")
            .cookie(cookie.clone())
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    actix_test::read_body_json(res).await
}

fn taken_request(cookie: &Cookie<'static>, body: Value) -> actix_http::Request {
    actix_test::TestRequest::post()
        .uri("/api/v1/taken")
        .cookie(cookie.clone())
        .set_json(body)
        .to_request()
}

fn single_body(routine: &RoutineEnvelope, entry: usize, slot: &str) -> Value {
    json!({
        "routineId": routine.routine.id,
        "routineMedicineId": routine.routine.medicines[entry].id,
        "date": WEDNESDAY,
        "day": "Wednesday",
        "slot": slot,
    })
}

#[actix_web::test]
async fn recording_a_dose_removes_it_from_upcoming() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let res = actix_test::call_service(
        &app,
        taken_request(&cookie, single_body(&routine, 0, "Morning")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: TakenEnvelope = actix_test::read_body_json(res).await;
    assert_eq!(body.taken.date, WEDNESDAY);
    assert_eq!(body.taken.slot, DoseSlot::Morning);

    let upcoming = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/routines/upcoming")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let upcoming: UpcomingDosesEnvelope = actix_test::read_body_json(upcoming).await;
    let first_entry: Vec<_> = upcoming
        .upcoming_doses
        .iter()
        .filter(|dose| dose.routine_medicine_id == routine.routine.medicines[0].id)
        .map(|dose| dose.slot)
        .collect();
    assert_eq!(first_entry, [DoseSlot::Afternoon, DoseSlot::Evening]);
}

#[actix_web::test]
async fn recording_twice_conflicts() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let first = actix_test::call_service(
        &app,
        taken_request(&cookie, single_body(&routine, 0, "Evening")),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = actix_test::call_service(
        &app,
        taken_request(&cookie, single_body(&routine, 0, "Evening")),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body: Value = actix_test::read_body_json(second).await;
    assert_eq!(body["code"], "conflict");
}

#[actix_web::test]
async fn concurrent_duplicates_yield_one_success() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let body = single_body(&routine, 1, "Morning");
    let (left, right) = futures::join!(
        actix_test::call_service(&app, taken_request(&cookie, body.clone())),
        actix_test::call_service(&app, taken_request(&cookie, body)),
    );
    let mut statuses = [left.status(), right.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
}

#[actix_web::test]
async fn slot_alias_time_is_accepted() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let body = json!({
        "routineId": routine.routine.id,
        "routineMedicineId": routine.routine.medicines[0].id,
        "date": WEDNESDAY,
        "day": "Wednesday",
        "time": "Afternoon",
    });
    let res = actix_test::call_service(&app, taken_request(&cookie, body)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[rstest]
#[case::iso_date("date", json!("2026-10-21"), "invalid_date")]
#[case::wrong_day("day", json!("Thursday"), "day_mismatch")]
#[case::unknown_slot("slot", json!("Noon"), "invalid_slot")]
#[case::bad_entry_id("routineMedicineId", json!("abc"), "invalid_uuid")]
#[actix_web::test]
async fn malformed_requests_are_unprocessable(
    #[case] field: &str,
    #[case] value: Value,
    #[case] code: &str,
) {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let mut body = single_body(&routine, 0, "Morning");
    body[field] = value;
    let res = actix_test::call_service(&app, taken_request(&cookie, body)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload: Value = actix_test::read_body_json(res).await;
    assert_eq!(payload["details"]["code"], code);
}

#[actix_web::test]
async fn unknown_entry_is_not_found() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let mut body = single_body(&routine, 0, "Morning");
    body["routineMedicineId"] = json!(RoutineMedicineId::random().to_string());
    let res = actix_test::call_service(&app, taken_request(&cookie, body)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

fn batch_request(cookie: &Cookie<'static>, body: Value) -> actix_http::Request {
    actix_test::TestRequest::post()
        .uri("/api/v1/taken/multiple")
        .cookie(cookie.clone())
        .set_json(body)
        .to_request()
}

#[actix_web::test]
async fn batch_records_every_entry() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let body = json!({
        "routineId": routine.routine.id,
        "routineMedicineIds": [routine.routine.medicines[0].id, routine.routine.medicines[1].id],
        "date": WEDNESDAY,
        "day": "Wednesday",
        "slot": "Evening",
    });
    let res = actix_test::call_service(&app, batch_request(&cookie, body)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: TakensEnvelope = actix_test::read_body_json(res).await;
    assert_eq!(body.takens.len(), 2);
}

#[rstest]
#[case::foreign_entry(StatusCode::NOT_FOUND)]
#[case::already_taken(StatusCode::CONFLICT)]
#[actix_web::test]
async fn batch_is_all_or_nothing(#[case] expected: StatusCode) {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    let routine = create_routine(&app, &cookie).await;

    let second = if expected == StatusCode::CONFLICT {
        let res = actix_test::call_service(
            &app,
            taken_request(&cookie, single_body(&routine, 1, "Morning")),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        routine.routine.medicines[1].id.clone()
    } else {
        RoutineMedicineId::random().to_string()
    };
    let body = json!({
        "routineId": routine.routine.id,
        "routineMedicineIds": [routine.routine.medicines[0].id, second],
        "date": WEDNESDAY,
        "day": "Wednesday",
        "slot": "Morning",
    });
    let res = actix_test::call_service(&app, batch_request(&cookie, body)).await;
    assert_eq!(res.status(), expected);

    let fetched = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/routines/{}", routine.routine.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let fetched: RoutineEnvelope = actix_test::read_body_json(fetched).await;
    let first_entry_taken = fetched
        .routine
        .taken
        .iter()
        .any(|t| t.routine_medicine_id == routine.routine.medicines[0].id);
    assert!(!first_entry_taken);
}
