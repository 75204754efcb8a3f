use std::time::Duration;

/// Runtime settings, read once at startup. Everything is env-overridable and
/// `.env` files are honored via dotenv.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub reaper_period: Duration,
    pub reaper_threshold_ms: i64,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            bind_addr: dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_owned()),
            database_url: dotenv::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://batepapo.db?mode=rwc".to_owned()),
            reaper_period: Duration::from_secs(env_or("REAPER_PERIOD_SECS", 15)),
            reaper_threshold_ms: env_or("REAPER_THRESHOLD_MS", 10_000),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    dotenv::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
