//! Behaviour tests for session configuration toggles.
//!
//! These scenarios validate that release builds enforce explicit toggle
//! configuration and reject insecure or missing settings, and that the
//! logged key fingerprint is stable for one key file.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::RefCell;
use std::path::PathBuf;

use actix_web::cookie::SameSite;
use medroutines::inbound::http::session_config::fingerprint::key_fingerprint;
use medroutines::inbound::http::session_config::{
    BuildMode, SessionConfigError, SessionSettings, SessionToggles, session_settings,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use uuid::Uuid;

#[derive(Debug)]
struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!("session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'a'; len])?;
        Ok(Self { path })
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

struct SessionConfigWorld {
    toggles: RefCell<SessionToggles>,
    mode: RefCell<BuildMode>,
    outcomes: RefCell<Vec<Result<SessionSettings, SessionConfigError>>>,
    key_files: RefCell<Vec<TempKeyFile>>,
}

impl SessionConfigWorld {
    fn new() -> Self {
        let missing = std::env::temp_dir().join(format!("missing-key-{}", Uuid::new_v4()));
        Self {
            toggles: RefCell::new(SessionToggles {
                key_file: Some(missing),
                ..SessionToggles::default()
            }),
            mode: RefCell::new(BuildMode::Release),
            outcomes: RefCell::new(Vec::new()),
            key_files: RefCell::new(Vec::new()),
        }
    }

    fn add_key_file(&self, len: usize) {
        let file = TempKeyFile::new(len).expect("key file creation should succeed");
        self.toggles.borrow_mut().key_file = Some(file.path.clone());
        self.key_files.borrow_mut().push(file);
    }

    fn evaluate(&self) {
        let result = session_settings(&self.toggles.borrow(), *self.mode.borrow());
        self.outcomes.borrow_mut().push(result);
    }

    fn with_settings<F>(&self, f: F)
    where
        F: FnOnce(&SessionSettings),
    {
        let outcomes = self.outcomes.borrow();
        let settings = outcomes
            .last()
            .expect("evaluation result")
            .as_ref()
            .expect("expected settings to succeed");
        f(settings);
    }

    fn with_error<F>(&self, f: F)
    where
        F: FnOnce(&SessionConfigError),
    {
        let outcomes = self.outcomes.borrow();
        let error = match outcomes.last().expect("evaluation result") {
            Ok(_) => panic!("expected settings to fail"),
            Err(error) => error,
        };
        f(error);
    }
}

fn parse_flag(value: &str) -> bool {
    value.parse().expect("true or false")
}

#[fixture]
fn world() -> SessionConfigWorld {
    SessionConfigWorld::new()
}

#[given("a release build configuration")]
fn a_release_build_configuration(world: &SessionConfigWorld) {
    *world.mode.borrow_mut() = BuildMode::Release;
}

#[given("a debug build configuration")]
fn a_debug_build_configuration(world: &SessionConfigWorld) {
    *world.mode.borrow_mut() = BuildMode::Debug;
}

#[given("cookie secure is set to {value}")]
fn cookie_secure_is_set(world: &SessionConfigWorld, value: String) {
    world.toggles.borrow_mut().cookie_secure = Some(parse_flag(&value));
}

#[given("same site is set to {value}")]
fn same_site_is_set(world: &SessionConfigWorld, value: String) {
    world.toggles.borrow_mut().same_site = Some(value);
}

#[given("ephemeral keys are allowed")]
fn ephemeral_keys_are_allowed(world: &SessionConfigWorld) {
    world.toggles.borrow_mut().allow_ephemeral = Some(true);
}

#[given("a session key file with {len} bytes")]
fn a_session_key_file_with_bytes(world: &SessionConfigWorld, len: usize) {
    world.add_key_file(len);
}

#[when("the session configuration is loaded")]
fn the_session_configuration_is_loaded(world: &SessionConfigWorld) {
    world.evaluate();
}

#[when("the session configuration is loaded twice")]
fn the_session_configuration_is_loaded_twice(world: &SessionConfigWorld) {
    world.evaluate();
    world.evaluate();
}

#[then("the configuration load succeeds")]
fn the_configuration_load_succeeds(world: &SessionConfigWorld) {
    world.with_settings(|_| {});
}

#[then("the cookie secure flag is true")]
fn the_cookie_secure_flag_is_true(world: &SessionConfigWorld) {
    world.with_settings(|settings| assert!(settings.cookie_secure));
}

#[then("the SameSite policy is {policy}")]
fn the_same_site_policy_is(world: &SessionConfigWorld, policy: String) {
    let expected = match policy.as_str() {
        "Strict" => SameSite::Strict,
        "Lax" => SameSite::Lax,
        "None" => SameSite::None,
        other => panic!("unknown SameSite policy {other}"),
    };
    world.with_settings(|settings| assert_eq!(settings.same_site, expected));
}

#[then("the configuration load fails because session_cookie_secure is missing")]
fn configuration_fails_missing_cookie_secure(world: &SessionConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(
            error,
            SessionConfigError::Missing {
                name: "session_cookie_secure"
            }
        ));
    });
}

#[then("the configuration load fails because ephemeral keys are not allowed")]
fn configuration_fails_ephemeral_not_allowed(world: &SessionConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(error, SessionConfigError::EphemeralNotAllowed));
    });
}

#[then("the configuration load fails because SameSite=None requires secure cookies")]
fn configuration_fails_insecure_same_site_none(world: &SessionConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(error, SessionConfigError::InsecureSameSiteNone));
    });
}

#[then("the configuration load fails because the key is too short")]
fn configuration_fails_key_too_short(world: &SessionConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(
            error,
            SessionConfigError::KeyTooShort {
                length: 16,
                min_len: 64,
                ..
            }
        ));
    });
}

#[then("both key fingerprints are identical")]
fn both_key_fingerprints_are_identical(world: &SessionConfigWorld) {
    let outcomes = world.outcomes.borrow();
    let fingerprints: Vec<String> = outcomes
        .iter()
        .map(|outcome| key_fingerprint(&outcome.as_ref().expect("settings").key))
        .collect();
    assert_eq!(fingerprints.len(), 2);
    assert_eq!(fingerprints.first(), fingerprints.last());
}

#[scenario(path = "tests/features/session_config.feature")]
fn session_configuration_scenarios(world: SessionConfigWorld) {
    let _ = world;
}
