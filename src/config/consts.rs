// src/config/consts.rs

// Storage
pub const DEFAULT_NAMESPACE: &str = ".";
pub const DEFAULT_STORE: &str = "json-lines";
pub const JSON_LINES_EXT: &str = "lines.json";
pub const CSV_EXT: &str = "csv";

// Logging
pub const LOG_FILE: &str = "debug.log";

// Net
pub const HTTP_TIMEOUT_SECS: u64 = 60;
pub const USER_AGENT: &str = concat!("mtdata/", env!("CARGO_PKG_VERSION"));
pub const AIRNOW_KEY_ENV: &str = "AIRNOW_API_KEY";

// Retry (linear back-off: attempt n waits n * delta)
pub const RETRY_ATTEMPTS: u32 = 3;
pub const RETRY_DELTA_SECS: u64 = 3;

// Datasets
pub const INCIDENT_LOOKBACK_DAYS: i64 = 7;
