//! Embedded PostgreSQL bootstrap shared by the Diesel integration suites.
//!
//! Each database is a temporary one on a fresh [`TestCluster`], migrated with
//! the same embedded migrations the server applies at startup. Binaries are
//! installed once under the target directory; data directories are unique
//! per cluster so parallel tests never share a postmaster.
//!
//! When the cluster cannot start (no network to fetch binaries, sandboxed
//! filesystem) the suites print a `SKIP-TEST-CLUSTER` marker and return.
//! Set `REQUIRE_TEST_CLUSTER=1` to turn that skip into a failure in CI.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use medroutines::outbound::persistence::run_pending_migrations;
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use uuid::Uuid;

static BOOTSTRAP_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// A migrated temporary database and the cluster that hosts it.
///
/// Field order matters: the database is dropped before its cluster.
pub struct MigratedDatabase {
    database: TemporaryDatabase,
    _cluster: TestCluster,
}

impl MigratedDatabase {
    pub fn url(&self) -> String {
        self.database.url().to_owned()
    }
}

fn pg_embed_dir() -> PathBuf {
    if let Some(target_dir) = std::env::var_os("CARGO_TARGET_DIR") {
        return PathBuf::from(target_dir).join("pg-embed");
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("target")
        .join("pg-embed")
}

fn start_cluster() -> Result<TestCluster, String> {
    let _bootstrap = BOOTSTRAP_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let base = pg_embed_dir();
    let runtime_dir = base.join("install");
    let data_dir = base.join(format!("data-{}-{}", std::process::id(), Uuid::new_v4()));
    std::fs::create_dir_all(&runtime_dir).map_err(|err| err.to_string())?;
    std::fs::create_dir_all(&data_dir).map_err(|err| err.to_string())?;

    let _env = env_lock::lock_env([
        ("PG_RUNTIME_DIR", Some(runtime_dir.to_string_lossy().into_owned())),
        ("PG_DATA_DIR", Some(data_dir.to_string_lossy().into_owned())),
    ]);
    TestCluster::new().map_err(|err| format!("{err:?}"))
}

/// Start a cluster and provision a migrated temporary database.
pub fn migrated_database() -> Result<MigratedDatabase, String> {
    let cluster = start_cluster()?;
    let name = format!("medroutines_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| format!("create database: {err:?}"))?;
    run_pending_migrations(database.url()).map_err(|err| err.to_string())?;
    Ok(MigratedDatabase {
        database,
        _cluster: cluster,
    })
}

fn cluster_required() -> bool {
    std::env::var("REQUIRE_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip the calling test, or fail it when a cluster is required.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if cluster_required() {
        panic!("Test cluster setup failed: {reason}");
    }
    eprintln!("SKIP-TEST-CLUSTER: {reason}");
    None
}
