//! Tests for routine handlers.

use super::*;
use crate::domain::ports::{FixtureLoginService, RoutineRepository, UserRepository};
use crate::domain::{ErrorCode, UserId};
use crate::inbound::http::test_utils::{TestBackend, api_app, sign_in};
use crate::outbound::memory::PREDEFINED_CATALOGUE;
use crate::test_support::{every_day, sample_entry, sample_routine, sample_user, utc_instant};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;

const PARACETAMOL: usize = 5;
const IBUPROFEN: usize = 2;

fn predefined_id(index: usize) -> String {
    PREDEFINED_CATALOGUE[index].0.to_string()
}

/// Wednesday 21/10/2026 at 10:00 in London.
async fn backend() -> TestBackend {
    TestBackend::new(utc_instant(2026, 10, 21, 9, 0), "Europe/London").await
}

fn throat_infection() -> Value {
    json!({
        "name": "Throat Infection",
        "medicines": [
            {
                "medicineType": "PredefinedMedicine",
                "medicineId": predefined_id(PARACETAMOL),
                "schedule": [
                    { "day": "Monday", "times": ["Morning", "Afternoon", "Evening"] },
                    { "day": "Tuesday", "times": ["Morning", "Afternoon", "Evening"] },
                    { "day": "Wednesday", "times": ["Morning", "Afternoon", "Evening"] },
                    { "day": "Thursday", "times": ["Morning", "Afternoon", "Evening"] },
                    { "day": "Friday", "times": ["Morning", "Afternoon", "Evening"] },
                    { "day": "Saturday", "times": ["Morning", "Afternoon", "Evening"] },
                    { "day": "Sunday", "times": ["Morning", "Afternoon", "Evening"] }
                ]
            },
            {
                "medicineType": "PredefinedMedicine",
                "medicineId": predefined_id(IBUPROFEN),
                "schedule": [
                    { "day": "Saturday", "times": ["Morning"] },
                    { "day": "Sunday", "times": ["Morning"] }
                ]
            }
        ]
    })
}

#[actix_web::test]
async fn created_routine_round_trips_its_schedule() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/routines")
            .cookie(cookie.clone())
            .set_json(throat_infection())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: RoutineEnvelope = actix_test::read_body_json(res).await;

    let fetched = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/routines/{}", created.routine.id))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched: RoutineEnvelope = actix_test::read_body_json(fetched).await;

    let names: Vec<_> = fetched
        .routine
        .medicines
        .iter()
        .map(|m| m.medicine_name.as_str())
        .collect();
    assert_eq!(names, ["Paracetamol", "Ibuprofen"]);
    assert_eq!(fetched.routine.medicines[1].schedule, vec![
        ScheduleRowResponse {
            day: Weekday::Saturday,
            times: vec![DoseSlot::Morning],
        },
        ScheduleRowResponse {
            day: Weekday::Sunday,
            times: vec![DoseSlot::Morning],
        },
    ]);
    assert!(fetched.routine.taken.is_empty());
}

#[actix_web::test]
async fn upcoming_lists_only_todays_outstanding_slots() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;
    actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/routines")
            .cookie(cookie.clone())
            .set_json(throat_infection())
            .to_request(),
    )
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/routines/upcoming")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: UpcomingDosesEnvelope = actix_test::read_body_json(res).await;

    let slots: Vec<_> = body.upcoming_doses.iter().map(|d| d.slot).collect();
    assert_eq!(slots, [DoseSlot::Morning, DoseSlot::Afternoon, DoseSlot::Evening]);
    assert!(body.upcoming_doses.iter().all(|d| {
        d.medicine_name == "Paracetamol"
            && d.local_day == Weekday::Wednesday
            && d.local_date == "21/10/2026"
    }));
}

#[actix_web::test]
async fn unknown_medicine_is_not_found_and_nothing_is_stored() {
    let backend = backend().await;
    let store = backend.store.clone();
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;

    let mut payload = throat_infection();
    payload["medicines"][1]["medicineId"] = json!("00000000-0000-4000-8000-000000000000");
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/routines")
            .cookie(cookie)
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let owner = FixtureLoginService::fixture_user_id().expect("fixture id");
    let stored = store.list_for_user(&owner).await.expect("list routines");
    assert!(stored.is_empty());
}

#[rstest]
#[case::unknown_slot(
    json!({ "day": "Monday", "times": ["Noon"] }),
    "invalid_slot"
)]
#[case::unknown_day(
    json!({ "day": "Someday", "times": ["Morning"] }),
    "invalid_day"
)]
#[case::no_slots(
    json!({ "day": "Monday", "times": [] }),
    "invalid_schedule"
)]
#[case::missing_times(json!({ "day": "Monday" }), "missing_field")]
#[actix_web::test]
async fn malformed_schedules_are_unprocessable(#[case] row: Value, #[case] code: &str) {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;

    let payload = json!({
        "name": "Allergies",
        "medicines": [{
            "medicineType": "PredefinedMedicine",
            "medicineId": predefined_id(1),
            "schedule": [row]
        }]
    });
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/routines")
            .cookie(cookie)
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], code);
    assert_eq!(body["details"]["medicineIndex"], 0);
}

#[rstest]
#[case::blank_name(json!({ "name": "  ", "medicines": [] }))]
#[case::no_medicines(json!({ "name": "Allergies", "medicines": [] }))]
#[case::bad_kind(json!({
    "name": "Allergies",
    "medicines": [{ "medicineType": "Herbal", "medicineId": predefined_id(1), "schedule": [] }]
}))]
#[actix_web::test]
async fn invalid_routines_are_unprocessable(#[case] payload: Value) {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/routines")
            .cookie(cookie)
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn other_users_routines_are_not_found() {
    let backend = backend().await;
    let stranger = UserId::random();
    backend
        .store
        .upsert(&sample_user(stranger.clone(), "Europe/Paris"))
        .await
        .expect("seed stranger");
    let mut entry = sample_entry("Paracetamol", every_day(&[DoseSlot::Morning]));
    let paracetamol = MedicineId::from_uuid(PREDEFINED_CATALOGUE[PARACETAMOL].0);
    entry.medicine = MedicineRef::predefined(paracetamol);
    let routine = sample_routine(&stranger, "Private", vec![entry]);
    backend.store.create(&routine).await.expect("store stranger routine");
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/routines/{}", routine.id()))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Error = actix_test::read_body_json(res).await;
    assert_eq!(body.code(), ErrorCode::NotFound);
}

#[actix_web::test]
async fn malformed_routine_id_is_unprocessable() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;
    let cookie = sign_in(&app).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/routines/not-a-uuid")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn routines_require_a_session() {
    let backend = backend().await;
    let app = actix_test::init_service(api_app(backend.state)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/routines").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
