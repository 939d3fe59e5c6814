use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Dedup
    pub dedup_threshold: f64,
    pub sweep_threshold: f64,

    // Digest
    pub digest_window_hours: i64,
    pub digest_target_count: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            dedup_threshold: parsed_env("DEDUP_THRESHOLD", 0.15),
            sweep_threshold: parsed_env("SWEEP_THRESHOLD", 0.95),
            digest_window_hours: parsed_env("DIGEST_WINDOW_HOURS", 24),
            digest_target_count: parsed_env("DIGEST_TARGET_COUNT", 3),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must parse as {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
