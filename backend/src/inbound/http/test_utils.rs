//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::test as actix_test;
use actix_web::{App, web};
use chrono::{DateTime, Utc};

use crate::Trace;
use crate::domain::ports::{FIXTURE_EMAIL, FixtureLoginService, UserRepository};
use crate::domain::{
    MedicineService, RoutineService, TakenService, UpcomingDosesService, UserProfileService,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::inbound::http::{api_json_config, configure_api};
use crate::outbound::memory::InMemoryStore;
use crate::test_support::MutableClock;

/// Build a session middleware configured for tests.
///
/// Uses a fresh key per call, names the cookie `session`, and disables the
/// `Secure` flag so plain HTTP test requests keep it.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// In-memory services wired the same way the server wires them.
pub struct TestBackend {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<MutableClock>,
    pub state: HttpState,
}

impl TestBackend {
    /// Backend with the fixture user living in `time_zone`.
    pub async fn new(now: DateTime<Utc>, time_zone: &str) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(MutableClock::new(now));
        let fixture = FixtureLoginService::fixture_user_id().expect("fixture id");
        store
            .upsert(&crate::test_support::sample_user(fixture, time_zone))
            .await
            .expect("seed fixture user");

        let routines = Arc::new(RoutineService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
        ));
        let state = HttpState::new(HttpStatePorts {
            login: Arc::new(FixtureLoginService),
            profile: Arc::new(UserProfileService::new(store.clone())),
            routines: routines.clone(),
            routines_query: routines,
            taken: Arc::new(TakenService::new(store.clone(), clock.clone())),
            upcoming: Arc::new(UpcomingDosesService::new(
                store.clone(),
                store.clone(),
                clock.clone(),
            )),
            medicines: Arc::new(MedicineService::new(store.clone())),
        });
        Self {
            store,
            clock,
            state,
        }
    }
}

/// Full `/api/v1` application over `state`.
pub fn api_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(api_json_config())
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .wrap(test_session_middleware())
                .configure(configure_api),
        )
}

/// Session cookie from a response, if one was set.
pub fn session_cookie(res: &ServiceResponse) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// Log in as the fixture user and return the session cookie.
pub async fn sign_in<S>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(serde_json::json!({ "email": FIXTURE_EMAIL, "password": "password" }))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "fixture login failed: {}", res.status());
    session_cookie(&res).expect("session cookie")
}
