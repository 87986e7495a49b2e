//! Runtime settings loaded via OrthoConfig.
//!
//! Every field is optional so the binary starts with no configuration at all:
//! an in-memory store, the logging notification adapter, and an ephemeral
//! session key in debug builds. Environment variables use the `MEDROUTINES_`
//! prefix, e.g. `MEDROUTINES_DATABASE_URL`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ReminderSweepConfig;
use crate::inbound::http::session_config::SessionToggles;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_REMINDER_HOUR: u32 = 10;
const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 30;
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 10;

/// Raised when a configured value is out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("reminder hour must be between 0 and 23, got {value}")]
    ReminderHour { value: u32 },
    #[error("sweep interval must be at least one minute")]
    SweepInterval,
    #[error("push endpoint is set but the push server key is missing")]
    MissingPushKey,
    #[error("invalid value for {name}='{value}'; expected true or false")]
    Flag { name: &'static str, value: String },
}

/// Settings for the medication routines server.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MEDROUTINES")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; without it state lives in memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Path of the session signing key.
    pub session_key_file: Option<PathBuf>,
    /// Mark the session cookie `Secure` (`true` or `false`).
    ///
    /// Held as text so an unset value stays distinguishable from `false`.
    pub session_cookie_secure: Option<String>,
    /// `Strict`, `Lax`, or `None`.
    pub session_same_site: Option<String>,
    /// Opt in to a generated key; refused in release builds.
    pub session_allow_ephemeral: Option<String>,
    /// Local hour at which reminders go out.
    pub reminder_hour: Option<u32>,
    /// Minutes between reminder sweeps.
    pub sweep_interval_minutes: Option<u64>,
    /// Push service URL; reminders are only logged without it.
    pub push_endpoint: Option<String>,
    /// Server key sent to the push service.
    pub push_server_key: Option<String>,
    pub push_timeout_secs: Option<u64>,
}

impl AppSettings {
    /// Listening address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Session-related toggles for
    /// [`session_settings`](crate::inbound::http::session_config::session_settings).
    ///
    /// Unset flags stay `None` so release builds can refuse them.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Flag`] when a flag is neither `true` nor
    /// `false`.
    pub fn session_toggles(&self) -> Result<SessionToggles, SettingsError> {
        Ok(SessionToggles {
            key_file: self.session_key_file.clone(),
            cookie_secure: parse_flag(
                "session_cookie_secure",
                self.session_cookie_secure.as_deref(),
            )?,
            same_site: self.session_same_site.clone(),
            allow_ephemeral: parse_flag(
                "session_allow_ephemeral",
                self.session_allow_ephemeral.as_deref(),
            )?,
        })
    }

    /// Reminder sweep configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ReminderHour`] for hours past 23.
    pub fn reminder_sweep(&self) -> Result<ReminderSweepConfig, SettingsError> {
        let reminder_hour = self.reminder_hour.unwrap_or(DEFAULT_REMINDER_HOUR);
        if reminder_hour > 23 {
            return Err(SettingsError::ReminderHour {
                value: reminder_hour,
            });
        }
        Ok(ReminderSweepConfig {
            reminder_hour,
            ..ReminderSweepConfig::default()
        })
    }

    /// Delay between reminder sweeps.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SweepInterval`] for a zero interval.
    pub fn sweep_interval(&self) -> Result<Duration, SettingsError> {
        let minutes = self
            .sweep_interval_minutes
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_MINUTES);
        if minutes == 0 {
            return Err(SettingsError::SweepInterval);
        }
        Ok(Duration::from_secs(minutes * 60))
    }

    /// Push endpoint and key, when push delivery is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingPushKey`] when an endpoint is set
    /// without a key.
    pub fn push(&self) -> Result<Option<(&str, &str)>, SettingsError> {
        match (
            self.push_endpoint.as_deref().filter(|v| !v.trim().is_empty()),
            self.push_server_key.as_deref(),
        ) {
            (None, _) => Ok(None),
            (Some(_), None) => Err(SettingsError::MissingPushKey),
            (Some(endpoint), Some(key)) => Ok(Some((endpoint, key))),
        }
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs.unwrap_or(DEFAULT_PUSH_TIMEOUT_SECS))
    }
}

fn parse_flag(name: &'static str, raw: Option<&str>) -> Result<Option<bool>, SettingsError> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        _ => Err(SettingsError::Flag {
            name,
            value: value.to_owned(),
        }),
    }
}
