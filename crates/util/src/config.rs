use std::{env, fmt, net::SocketAddr};

use super::server_bind_address;

/// Order subtotal above which checkout quotes ship for free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: f64 = 100.0;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Knobs for the server-side checkout quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutConfig {
    pub free_shipping_threshold: f64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
        }
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let Ok(raw) = env::var("CHECKOUT_FREE_SHIPPING_THRESHOLD") else {
            return Ok(Self::default());
        };
        let threshold = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| ConfigError::InvalidThreshold(raw.clone()))?;
        Ok(Self {
            free_shipping_threshold: threshold,
        })
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let checkout = CheckoutConfig::from_env()?;

        Ok(Self {
            bind_addr,
            environment,
            checkout,
        })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    InvalidThreshold(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::InvalidThreshold(value) => write!(
                f,
                "CHECKOUT_FREE_SHIPPING_THRESHOLD must be a non-negative number (got {value})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::ENV_GUARD;
    use crate::DEFAULT_BIND_ADDR;

    fn clear_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_BIND_ADDR");
        env::remove_var("CHECKOUT_FREE_SHIPPING_THRESHOLD");
    }

    #[test]
    fn loads_defaults_in_development() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();

        let config = AppConfig::from_env().expect("config should load with defaults");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(
            config.checkout.free_shipping_threshold,
            DEFAULT_FREE_SHIPPING_THRESHOLD
        );
    }

    #[test]
    fn rejects_invalid_environment() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_ENV", "invalid");

        let err = AppConfig::from_env().expect_err("invalid env should error");
        assert!(matches!(err, ConfigError::InvalidEnvironment(value) if value == "invalid"));

        clear_env();
    }

    #[test]
    fn parses_production_environment() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_BIND_ADDR", "0.0.0.0:9000");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9000");

        clear_env();
    }

    #[test]
    fn reads_free_shipping_threshold() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("CHECKOUT_FREE_SHIPPING_THRESHOLD", "75.5");

        let config = AppConfig::from_env().expect("config should load");
        assert_eq!(config.checkout.free_shipping_threshold, 75.5);

        clear_env();
    }

    #[test]
    fn rejects_negative_threshold() {
        let _guard = ENV_GUARD.lock().expect("env guard poisoned");
        clear_env();
        env::set_var("CHECKOUT_FREE_SHIPPING_THRESHOLD", "-1");

        let err = AppConfig::from_env().expect_err("negative threshold should error");
        assert!(matches!(err, ConfigError::InvalidThreshold(value) if value == "-1"));

        clear_env();
    }
}
