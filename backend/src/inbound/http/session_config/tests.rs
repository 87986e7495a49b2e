//! Unit tests for session configuration validation.

use super::*;
use rstest::{fixture, rstest};
use uuid::Uuid;

struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'a'; len]).expect("write temporary key");
        Self { path }
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[fixture]
fn long_key() -> TempKeyFile {
    TempKeyFile::new(SESSION_KEY_MIN_LEN)
}

fn release_toggles(key: &TempKeyFile) -> SessionToggles {
    SessionToggles {
        key_file: Some(key.path.clone()),
        cookie_secure: Some(true),
        same_site: Some("Strict".to_owned()),
        allow_ephemeral: Some(false),
    }
}

#[rstest]
fn release_accepts_complete_toggles(long_key: TempKeyFile) {
    let settings =
        session_settings(&release_toggles(&long_key), BuildMode::Release).expect("valid settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
fn release_rejects_missing_cookie_flag(long_key: TempKeyFile) {
    let toggles = SessionToggles {
        cookie_secure: None,
        ..release_toggles(&long_key)
    };
    let err = session_settings(&toggles, BuildMode::Release).err();
    assert!(matches!(err, Some(SessionConfigError::Missing { .. })));
}

#[rstest]
fn release_rejects_short_keys() {
    let short = TempKeyFile::new(SESSION_KEY_MIN_LEN - 1);
    let err = session_settings(&release_toggles(&short), BuildMode::Release).err();
    assert!(matches!(err, Some(SessionConfigError::KeyTooShort { .. })));
}

#[rstest]
fn release_rejects_ephemeral_keys(long_key: TempKeyFile) {
    let toggles = SessionToggles {
        allow_ephemeral: Some(true),
        ..release_toggles(&long_key)
    };
    let err = session_settings(&toggles, BuildMode::Release).err();
    assert!(matches!(err, Some(SessionConfigError::EphemeralNotAllowed)));
}

#[rstest]
fn release_rejects_insecure_same_site_none(long_key: TempKeyFile) {
    let toggles = SessionToggles {
        cookie_secure: Some(false),
        same_site: Some("None".to_owned()),
        ..release_toggles(&long_key)
    };
    let err = session_settings(&toggles, BuildMode::Release).err();
    assert!(matches!(err, Some(SessionConfigError::InsecureSameSiteNone)));
}

#[rstest]
fn release_requires_a_readable_key() {
    let toggles = SessionToggles {
        key_file: Some(std::env::temp_dir().join(format!("missing-{}", Uuid::new_v4()))),
        cookie_secure: Some(true),
        same_site: Some("Lax".to_owned()),
        allow_ephemeral: Some(false),
    };
    let err = session_settings(&toggles, BuildMode::Release).err();
    assert!(matches!(err, Some(SessionConfigError::KeyRead { .. })));
}

#[rstest]
#[case(Some("bogus"), SameSite::Lax)]
#[case(None, SameSite::Lax)]
#[case(Some("strict"), SameSite::Strict)]
fn debug_falls_back_to_lax(#[case] raw: Option<&str>, #[case] expected: SameSite) {
    let toggles = SessionToggles {
        key_file: Some(std::env::temp_dir().join(format!("missing-{}", Uuid::new_v4()))),
        same_site: raw.map(str::to_owned),
        ..SessionToggles::default()
    };
    let settings = session_settings(&toggles, BuildMode::Debug).expect("debug tolerates gaps");
    assert_eq!(settings.same_site, expected);
    assert!(settings.cookie_secure);
}
