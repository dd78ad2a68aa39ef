use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::domain::delivery::DeliverySeed;
use crate::domain::order::OrderServiceConfig;
use crate::utils::RetryConfig;

// ============================================================================
// Configuration
// ============================================================================
//
// TOML file, every field optional. The path comes from ORDER_LIFECYCLE_CONFIG;
// without it the defaults apply. ORDER_LIFECYCLE_HTTP_PORT and
// ORDER_LIFECYCLE_METRICS_PORT override the ports after the file is read.
// `[[deliveries]]` tables list couriers written to the store at startup.
//
// ============================================================================

pub const CONFIG_PATH_VAR: &str = "ORDER_LIFECYCLE_CONFIG";
const ENV_PREFIX: &str = "ORDER_LIFECYCLE_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub http: HttpConfig,
    pub metrics: MetricsConfig,
    pub store: StoreConfig,
    pub orders: OrdersConfig,
    pub deliveries: Vec<DeliverySeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

/// Retry budget for conflicting transactions
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let retry = RetryConfig::aggressive();
        Self {
            max_attempts: retry.max_attempts,
            initial_delay_ms: retry.initial_delay.as_millis() as u64,
            max_delay_ms: retry.max_delay.as_millis() as u64,
            multiplier: retry.multiplier,
        }
    }
}

impl StoreConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrdersConfig {
    pub operation_timeout_ms: u64,
    pub require_free_courier: bool,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 5_000,
            require_free_courier: false,
        }
    }
}

impl OrdersConfig {
    pub fn service(&self) -> OrderServiceConfig {
        OrderServiceConfig {
            operation_timeout: Duration::from_millis(self.operation_timeout_ms),
            require_free_courier: self.require_free_courier,
        }
    }
}

impl Config {
    /// Loads from `ORDER_LIFECYCLE_CONFIG` if set, otherwise defaults, then
    /// applies env overrides and validates.
    pub async fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::read_file(&path).await?,
            Err(_) => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read_file(path).await?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    async fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = env::var(format!("{ENV_PREFIX}HTTP_PORT")) {
            self.http.port = port
                .parse()
                .map_err(|e| ConfigError::ValidationError(format!("Invalid HTTP port: {}", e)))?;
        }

        if let Ok(port) = env::var(format!("{ENV_PREFIX}METRICS_PORT")) {
            self.metrics.port = port
                .parse()
                .map_err(|e| ConfigError::ValidationError(format!("Invalid metrics port: {}", e)))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "store.max_attempts must be at least 1".to_string(),
            ));
        }

        // Written so NaN fails too
        if !(self.store.multiplier >= 1.0) {
            return Err(ConfigError::ValidationError(
                "store.multiplier must be >= 1.0".to_string(),
            ));
        }

        if self.store.initial_delay_ms > self.store.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "store.initial_delay_ms cannot exceed store.max_delay_ms".to_string(),
            ));
        }

        if self.orders.operation_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "orders.operation_timeout_ms must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for seed in &self.deliveries {
            if seed.id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "deliveries.id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(seed.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "delivery {} is listed twice",
                    seed.id
                )));
            }
        }

        if self.metrics.enabled && self.metrics.port == self.http.port {
            return Err(ConfigError::ValidationError(format!(
                "metrics.port and http.port are both {}",
                self.http.port
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::delivery::DeliveryStatus;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.max_attempts, 5);
        assert_eq!(config.orders.service().operation_timeout, Duration::from_secs(5));
        assert!(!config.orders.require_free_courier);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [http]
            port = 3000

            [orders]
            require_free_courier = true
            "#,
        )
        .unwrap();

        assert_eq!(config.http.port, 3000);
        assert_eq!(config.http.host, "0.0.0.0");
        assert!(config.orders.require_free_courier);
        assert_eq!(config.orders.operation_timeout_ms, 5_000);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_store_section_maps_to_retry() {
        let config = Config::from_toml_str(
            r#"
            [store]
            max_attempts = 8
            initial_delay_ms = 10
            max_delay_ms = 500
            multiplier = 1.5
            "#,
        )
        .unwrap();

        let retry = config.store.retry();
        assert_eq!(retry.max_attempts, 8);
        assert_eq!(retry.initial_delay, Duration::from_millis(10));
        assert_eq!(retry.max_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_attempts = Config::from_toml_str("[store]\nmax_attempts = 0").unwrap();
        assert!(matches!(zero_attempts.validate(), Err(ConfigError::ValidationError(_))));

        let zero_timeout = Config::from_toml_str("[orders]\noperation_timeout_ms = 0").unwrap();
        assert!(zero_timeout.validate().is_err());

        let same_ports = Config::from_toml_str("[http]\nport = 9090").unwrap();
        assert!(same_ports.validate().is_err());

        let shrinking = Config::from_toml_str("[store]\nmultiplier = 0.5").unwrap();
        assert!(shrinking.validate().is_err());

        let not_a_number = Config::from_toml_str("[store]\nmultiplier = nan").unwrap();
        assert!(not_a_number.store.multiplier.is_nan());
        assert!(matches!(not_a_number.validate(), Err(ConfigError::ValidationError(_))));

        let metrics_off = Config::from_toml_str("[http]\nport = 9090\n[metrics]\nenabled = false").unwrap();
        assert!(metrics_off.validate().is_ok());
    }

    #[test]
    fn test_delivery_seeds() {
        let config = Config::from_toml_str(
            r#"
            [[deliveries]]
            id = "d1"
            name = "Carlos"
            vehicle_type = "bicycle"

            [[deliveries]]
            id = "d2"
            status = "busy"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.deliveries.len(), 2);
        assert_eq!(config.deliveries[0].status, DeliveryStatus::Free);
        assert_eq!(config.deliveries[0].name.as_deref(), Some("Carlos"));
        assert_eq!(config.deliveries[1].status, DeliveryStatus::Busy);
        assert!(Config::default().deliveries.is_empty());

        let duplicated = Config::from_toml_str("[[deliveries]]\nid = \"d1\"\n[[deliveries]]\nid = \"d1\"").unwrap();
        assert!(matches!(duplicated.validate(), Err(ConfigError::ValidationError(_))));

        let misspelled = Config::from_toml_str("[[deliveries]]\nid = \"d1\"\nplate = \"X\"");
        assert!(matches!(misspelled, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_keys_are_parse_errors() {
        let result = Config::from_toml_str("[orders]\ntimeout = 10");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = Config::load("/nonexistent/order-lifecycle.toml").await;
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
