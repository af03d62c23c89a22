//! Application constants.
//!
//! Centralizes magic numbers and configuration defaults for better maintainability.

/// Civil calendar constants.
pub mod calendar {
    /// IANA timezone used for reading days when none is configured.
    pub const DEFAULT_TIMEZONE: &str = "America/New_York";

    /// Canonical reading-day format (`YYYY-MM-DD`).
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Length of a canonical reading-day string.
    pub const DATE_LEN: usize = 10;
}

/// Retry and backoff constants.
pub mod retry {
    /// Attempts for read-only fetches (initial try included).
    pub const DEFAULT_READ_ATTEMPTS: u32 = 3;

    /// Attempts for writes: the initial try plus one replay.
    pub const DEFAULT_WRITE_ATTEMPTS: u32 = 2;

    /// Delay before the first retry.
    pub const BASE_BACKOFF_MS: u64 = 200;

    /// Upper bound for a single backoff delay.
    pub const MAX_BACKOFF_MS: u64 = 2_000;
}

/// HTTP client constants.
pub mod http {
    /// Default request timeout for the persistence collaborator.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
}

/// Supabase table names.
pub mod tables {
    /// Per-user, per-day section completion rows.
    pub const DAILY_READINGS: &str = "daily_readings";

    /// One streak row per user.
    pub const USER_STREAKS: &str = "user_streaks";
}
