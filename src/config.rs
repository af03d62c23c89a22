//! Application configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use chrono_tz::Tz;
use dotenv::dotenv;
use std::env;
use std::time::Duration;

use crate::constants::{calendar, http, retry};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The application name
    app_name: String,
    /// The application version
    app_version: String,
    /// Supabase project URL (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Supabase API key sent as `apikey` and bearer token
    pub supabase_key: String,
    /// Timezone that defines the civil reading day
    pub timezone: Tz,
    /// Attempts for read-only fetches
    pub read_attempts: u32,
    /// Attempts for writes
    pub write_attempts: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Config {
    /// Get the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            supabase_url: String::new(),
            supabase_key: String::new(),
            timezone: chrono_tz::America::New_York,
            read_attempts: retry::DEFAULT_READ_ATTEMPTS,
            write_attempts: retry::DEFAULT_WRITE_ATTEMPTS,
            request_timeout: Duration::from_secs(http::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = env::var("SUPABASE_URL") {
            config.supabase_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(key) = env::var("SUPABASE_KEY") {
            config.supabase_key = key;
        }

        let tz_name =
            env::var("READING_TIMEZONE").unwrap_or_else(|_| calendar::DEFAULT_TIMEZONE.to_string());
        config.timezone = parse_timezone(&tz_name)?;

        if let Some(n) = parse_env_u32("READING_READ_ATTEMPTS") {
            config.read_attempts = n.max(1);
        }

        // Writes replay at most once; larger values are clamped.
        if let Some(n) = parse_env_u32("READING_WRITE_ATTEMPTS") {
            config.write_attempts = n.clamp(1, retry::DEFAULT_WRITE_ATTEMPTS);
        }

        if let Some(secs) = parse_env_u32("READING_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(u64::from(secs.max(1)));
        }

        Ok(config)
    }

    /// Check if Supabase is configured
    pub fn has_supabase_credentials(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_key.is_empty()
    }

    /// Retry policy for read-only fetches
    pub fn read_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.read_attempts)
    }

    /// Retry policy for writes
    pub fn write_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.write_attempts)
    }
}

/// Parse an IANA timezone name such as `America/Chicago`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim().parse::<Tz>().map_err(|e| {
        Error::config(
            format!("Unknown timezone {name:?}: {e}"),
            "Set READING_TIMEZONE to an IANA name like America/New_York",
        )
    })
}

fn parse_env_u32(key: &str) -> Option<u32> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a non-negative integer", key, raw);
            None
        }
    }
}
