//! Runtime settings loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

use crate::db;
use crate::reminders::DEFAULT_UPCOMING_FASTS;
use crate::timeline::DEFAULT_LEAD_TIME_MINUTES;

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 17020;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Database file (from FASTLINE_DB_PATH)
    pub db_path: PathBuf,
    /// HTTP port for `serve` (from FASTLINE_PORT)
    pub port: u16,
    /// Reminder lead time in minutes (from FASTLINE_LEAD_TIME_MINUTES)
    pub lead_time_minutes: i64,
    /// Upcoming fasts to derive reminders for (from FASTLINE_UPCOMING_FASTS)
    pub upcoming_fasts: usize,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let db_path = match std::env::var("FASTLINE_DB_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => db::default_path()?,
        };

        Ok(Self {
            db_path,
            port: env_or("FASTLINE_PORT", DEFAULT_PORT),
            lead_time_minutes: env_or("FASTLINE_LEAD_TIME_MINUTES", DEFAULT_LEAD_TIME_MINUTES)
                .max(0),
            upcoming_fasts: env_or("FASTLINE_UPCOMING_FASTS", DEFAULT_UPCOMING_FASTS),
        })
    }

    pub fn lead_time(&self) -> Duration {
        Duration::minutes(self.lead_time_minutes)
    }
}

/// Parse `key` from the environment, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}
