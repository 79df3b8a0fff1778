//! Process configuration, loaded from the environment.
//!
//! Hand-rolled config construction sourced from environment variables —
//! no config-framework dependency, just a struct built field by field.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub http_port: u16,

    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub log_rotation: String,
    pub use_json: bool,

    pub qr_provider_base_url: String,
    pub qr_provider_timeout: Duration,

    pub draft_sweep_interval: Duration,
    pub draft_lease_duration: Duration,
    pub draft_default_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            http_port: env_or("HTTP_PORT", "8080").parse()?,

            log_level: env_or("LOG_LEVEL", "info"),
            log_dir: env_or("LOG_DIR", "logs"),
            log_file: env_or("LOG_FILE", "resto-core.log"),
            log_rotation: env_or("LOG_ROTATION", "daily"),
            use_json: env_or("LOG_JSON", "false").parse().unwrap_or(false),

            qr_provider_base_url: env_or("QR_PROVIDER_BASE_URL", "https://api.mercadopago.com"),
            qr_provider_timeout: Duration::from_secs(
                env_or("QR_PROVIDER_TIMEOUT_SECS", "10").parse()?,
            ),

            draft_sweep_interval: Duration::from_secs(
                env_or("DRAFT_SWEEP_INTERVAL_SECS", "30").parse()?,
            ),
            draft_lease_duration: Duration::from_secs(30 * 60),
            draft_default_ttl: Duration::from_secs(2 * 60 * 60),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("missing required env var {key}"))
}
