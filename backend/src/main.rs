//! Medication routines server: REST API, reminder sweep, and OpenAPI docs.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

use medroutines::domain::ports::{FixtureLoginService, NotificationDelivery, UserRepository};
use medroutines::domain::{ReminderScheduler, ScheduledSweep};
use medroutines::inbound::http::health::HealthState;
use medroutines::inbound::http::session_config::fingerprint::key_fingerprint;
use medroutines::inbound::http::session_config::{BuildMode, session_settings};
use medroutines::outbound::delivery::{
    HttpNotificationDelivery, LoggingNotificationDelivery, PushEndpoint,
};
use medroutines::outbound::memory::InMemoryStore;
use medroutines::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use medroutines::settings::AppSettings;

use server::{ServerConfig, ServiceInputs, Storage, build_app_services, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    let session = session_settings(
        &settings.session_toggles()?,
        BuildMode::from_debug_assertions(),
    )?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );

    let storage = open_storage(&settings).await?;
    seed_fixture_user(&storage).await?;
    info!(storage = storage.label(), "storage ready");

    let services = build_app_services(
        &storage,
        ServiceInputs {
            clock: Arc::new(DefaultClock),
            delivery: build_delivery(&settings)?,
            sweep_config: settings.reminder_sweep()?,
        },
    );
    let scheduler = ReminderScheduler::start(
        services.sweep.clone() as Arc<dyn ScheduledSweep>,
        settings.sweep_interval()?,
    );

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(session, settings.bind_addr()?);
    let bind_addr = config.bind_addr();
    let server = create_server(health_state.clone(), services.http_state, config)?;
    health_state.mark_ready();
    info!(%bind_addr, "listening");

    let served = server.await;
    health_state.mark_unhealthy();
    scheduler.stop().await;
    served.wrap_err("server terminated with an error")
}

async fn open_storage(settings: &AppSettings) -> Result<Storage> {
    let Some(url) = settings.database_url() else {
        warn!("no database configured; state is kept in memory");
        return Ok(Storage::Memory(Arc::new(InMemoryStore::new())));
    };

    let migration_url = url.to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .wrap_err("migration task panicked")??;
    info!(applied, "database migrations complete");

    let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.pool_max_size())).await?;
    Ok(Storage::Postgres(pool))
}

/// Make sure the login fixture account exists without clobbering its tokens.
async fn seed_fixture_user(storage: &Storage) -> Result<()> {
    let users: Arc<dyn UserRepository> = match storage {
        Storage::Postgres(pool) => Arc::new(DieselUserRepository::new(pool.clone())),
        Storage::Memory(store) => store.clone(),
    };
    let fixture = FixtureLoginService::fixture_user()?;
    if users.find_by_id(fixture.id()).await?.is_none() {
        users.upsert(&fixture).await?;
        info!(user_id = %fixture.id(), "seeded fixture user");
    }
    Ok(())
}

fn build_delivery(settings: &AppSettings) -> Result<Arc<dyn NotificationDelivery>> {
    match settings.push()? {
        Some((endpoint, key)) => {
            let url = reqwest::Url::parse(endpoint)
                .map_err(|err| eyre!("invalid push endpoint {endpoint}: {err}"))?;
            let delivery = HttpNotificationDelivery::new(
                PushEndpoint {
                    url,
                    server_key: Zeroizing::new(key.to_owned()),
                },
                settings.push_timeout(),
            )?;
            info!(%endpoint, "push delivery enabled");
            Ok(Arc::new(delivery))
        }
        None => {
            warn!("no push endpoint configured; reminders are logged only");
            Ok(Arc::new(LoggingNotificationDelivery))
        }
    }
}
