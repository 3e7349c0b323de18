//! Service configuration.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use xolbor_core::STARTING_BONUS;

/// Which ledger store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process tables; nothing survives a restart.
    Memory,
    /// `RocksDB` under `data_dir`.
    Rocksdb,
}

impl StoreBackend {
    /// The backend used when `STORE_BACKEND` is unset.
    #[must_use]
    pub const fn compiled_default() -> Self {
        if cfg!(feature = "rocksdb-backend") {
            Self::Rocksdb
        } else {
            Self::Memory
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" | "rocks" => Ok(Self::Rocksdb),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/xolbor").
    pub data_dir: String,

    /// Ledger store backend.
    pub store_backend: StoreBackend,

    /// HMAC secret for access tokens. A random per-process secret is used
    /// when unset, which invalidates all tokens on restart.
    pub jwt_secret: Option<String>,

    /// Issuer claim of access tokens (default: "xolbor").
    pub jwt_issuer: String,

    /// Access token lifetime in minutes (default: 7 days).
    pub token_ttl_minutes: i64,

    /// Admin API key for catalog management. Admin routes reject every
    /// request when unset.
    pub admin_api_key: Option<String>,

    /// Shared secret of the payment provider's webhook signatures.
    pub payment_webhook_secret: Option<String>,

    /// Maximum age of a webhook signature timestamp, in seconds.
    pub webhook_tolerance_seconds: i64,

    /// Xubor credited to every new account.
    pub starting_bonus: i64,

    /// Insert the default skins at startup.
    pub seed_catalog: bool,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Secrets file structure.
#[derive(Debug, Default, Deserialize)]
struct XolborSecrets {
    #[serde(default)]
    jwt_secret: Option<String>,
    #[serde(default)]
    admin_api_key: Option<String>,
    #[serde(default)]
    payment_webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and the secrets file.
    #[must_use]
    pub fn from_env() -> Self {
        let secrets = load_secrets();
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            store_backend: std::env::var("STORE_BACKEND")
                .ok()
                .and_then(|s| {
                    s.parse()
                        .map_err(|e: String| tracing::warn!(error = %e, "Ignoring STORE_BACKEND"))
                        .ok()
                })
                .unwrap_or(defaults.store_backend),
            jwt_secret: std::env::var("JWT_SECRET").ok().or(secrets.jwt_secret),
            jwt_issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            token_ttl_minutes: env_parse("TOKEN_TTL_MINUTES").unwrap_or(defaults.token_ttl_minutes),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok().or(secrets.admin_api_key),
            payment_webhook_secret: std::env::var("PAYMENT_WEBHOOK_SECRET")
                .ok()
                .or(secrets.payment_webhook_secret),
            webhook_tolerance_seconds: env_parse("WEBHOOK_TOLERANCE_SECONDS")
                .unwrap_or(defaults.webhook_tolerance_seconds),
            starting_bonus: env_parse("STARTING_BONUS")
                .filter(|bonus: &i64| *bonus >= 0)
                .unwrap_or(defaults.starting_bonus),
            seed_catalog: std::env::var("SEED_CATALOG")
                .ok()
                .map_or(defaults.seed_catalog, |s| parse_bool(&s)),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Load secrets from the first secrets file found.
fn load_secrets() -> XolborSecrets {
    let secret_paths = [
        ".secrets/xolbor.json",
        "xolbor/.secrets/xolbor.json",
        "../.secrets/xolbor.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<XolborSecrets>(path) {
            tracing::info!(path = %path, "Loaded secrets from file");
            return secrets;
        }
    }

    tracing::debug!("Secrets file not found, using environment variables");
    XolborSecrets::default()
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/xolbor".into(),
            store_backend: StoreBackend::compiled_default(),
            jwt_secret: None,
            jwt_issuer: "xolbor".into(),
            token_ttl_minutes: 7 * 24 * 60,
            admin_api_key: None,
            payment_webhook_secret: None,
            webhook_tolerance_seconds: 300,
            starting_bonus: STARTING_BONUS,
            seed_catalog: true,
            cors_origins: vec!["*".into()],
            max_body_bytes: 64 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.token_ttl_minutes, 10_080);
        assert_eq!(config.starting_bonus, 100);
        assert_eq!(config.max_body_bytes, 65_536);
        assert!(config.seed_catalog);
    }

    #[test]
    fn store_backend_parses() {
        assert_eq!("memory".parse(), Ok(StoreBackend::Memory));
        assert_eq!(" RocksDB ".parse(), Ok(StoreBackend::Rocksdb));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn bool_and_origin_parsing() {
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));

        assert_eq!(
            parse_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
