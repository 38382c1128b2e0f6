//! App state: record service and config.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use cotify_core::constants::{DEFAULT_RECORD_TTL_SECS, DEFAULT_SWEEP_INTERVAL_SECS};
use cotify_core::error::Result;
use cotify_core::traits::RecordStore;
use cotify_service::{RecordService, ServiceConfig};
use cotify_store::MemoryStore;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Turso database URL; records stay in memory when unset
    pub database_url: Option<String>,
    /// Turso auth token
    pub database_token: Option<String>,
    /// Whether lookups are cached
    pub enable_cache: bool,
    /// Cache TTL in seconds
    pub cache_ttl_seconds: u64,
    /// Cache sweep interval in seconds
    pub sweep_interval_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_token: None,
            enable_cache: true,
            cache_ttl_seconds: DEFAULT_RECORD_TTL_SECS,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the environment (and `.env`, if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            database_url: non_empty_var("COTIFY_DATABASE_URL"),
            database_token: non_empty_var("COTIFY_DATABASE_TOKEN"),
            enable_cache: std::env::var("COTIFY_ENABLE_CACHE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            cache_ttl_seconds: parse_var("COTIFY_CACHE_TTL_SECS", DEFAULT_RECORD_TTL_SECS),
            sweep_interval_seconds: parse_var(
                "COTIFY_CACHE_SWEEP_SECS",
                DEFAULT_SWEEP_INTERVAL_SECS,
            ),
        }
    }

    /// Coordinator settings derived from this config.
    pub fn service_config(&self) -> ServiceConfig {
        let config = ServiceConfig::default()
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_seconds))
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_seconds));

        if self.enable_cache {
            config
        } else {
            config.no_cache()
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(name, value = %raw, default, "Ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

/// Shared handler state.
pub struct AppState {
    /// Server configuration
    pub config: ApiConfig,
    /// Cache-aside record service
    pub service: RecordService,
    started_at: Instant,
}

impl AppState {
    /// Builds state around an existing backend.
    pub fn with_store(config: ApiConfig, store: Arc<dyn RecordStore>) -> Self {
        let service = RecordService::with_config(store, config.service_config());
        Self {
            config,
            service,
            started_at: Instant::now(),
        }
    }

    /// Opens the configured backend and builds state around it.
    pub async fn connect(config: ApiConfig) -> Result<Self> {
        let store = open_store(&config).await?;
        Ok(Self::with_store(config, store))
    }

    /// Time since the state was built.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

async fn open_store(config: &ApiConfig) -> Result<Arc<dyn RecordStore>> {
    match &config.database_url {
        None => {
            warn!("COTIFY_DATABASE_URL not set; records are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
        Some(url) => open_turso(url, config.database_token.as_deref()).await,
    }
}

#[cfg(feature = "turso")]
async fn open_turso(url: &str, token: Option<&str>) -> Result<Arc<dyn RecordStore>> {
    let store = cotify_store::TursoStore::open_remote(url, token.unwrap_or_default()).await?;
    tracing::info!("Using Turso record store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "turso"))]
async fn open_turso(_url: &str, _token: Option<&str>) -> Result<Arc<dyn RecordStore>> {
    Err(cotify_core::CotifyError::ConfigError(
        "COTIFY_DATABASE_URL is set but this build lacks the `turso` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_follows_settings() {
        let config = ApiConfig {
            cache_ttl_seconds: 60,
            sweep_interval_seconds: 5,
            ..Default::default()
        };
        let service = config.service_config();

        assert!(service.enable_cache);
        assert_eq!(service.cache.default_ttl, Duration::from_secs(60));
        assert_eq!(service.cache.sweep_interval, Duration::from_secs(5));

        let disabled = ApiConfig {
            enable_cache: false,
            ..Default::default()
        };
        assert!(!disabled.service_config().enable_cache);
    }

    #[tokio::test]
    async fn test_connect_without_database_uses_memory() {
        let state = AppState::connect(ApiConfig::default()).await.unwrap();
        assert_eq!(state.service.store().count().await.unwrap(), 0);
        state.service.shutdown();
    }

    #[cfg(not(feature = "turso"))]
    #[tokio::test]
    async fn test_database_url_requires_turso_feature() {
        let config = ApiConfig {
            database_url: Some("libsql://db.example.turso.io".into()),
            ..Default::default()
        };
        let err = AppState::connect(config).await.err().unwrap();
        assert!(err.is_validation_error());
    }
}
