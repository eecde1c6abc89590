//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct: chain id, logging, the addresses of
//! the deployed components and order-manager tuning.
//!
//! # Example
//!
//! ```no_run
//! use lendflow::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use alloy_primitives::Address;
use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::application::order::DEFAULT_VALIDITY_WINDOW;
use crate::error::{ConfigError, Result};

/// Addresses of the deployed components.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    pub router: Address,
    pub order_manager: Address,
    pub hooks_trampoline: Address,
    /// The external settlement contract; the EIP-712 verifying contract.
    pub settlement: Address,
}

impl DeploymentConfig {
    fn named(&self) -> [(&'static str, Address); 4] {
        [
            ("router", self.router),
            ("order_manager", self.order_manager),
            ("hooks_trampoline", self.hooks_trampoline),
            ("settlement", self.settlement),
        ]
    }
}

/// Order manager tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    /// Length of the window a quoted trade stays valid for.
    #[serde(default = "default_validity_window")]
    pub validity_window_secs: u64,

    /// Gas limit written into generated hook appData.
    #[serde(default = "default_hook_gas_limit")]
    pub default_hook_gas_limit: u64,

    /// Addresses allowed to fund orders besides the hooks trampoline.
    #[serde(default)]
    pub funders: Vec<Address>,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            validity_window_secs: default_validity_window(),
            default_hook_gas_limit: default_hook_gas_limit(),
            funders: Vec::new(),
        }
    }
}

const fn default_validity_window() -> u64 {
    DEFAULT_VALIDITY_WINDOW
}

const fn default_hook_gas_limit() -> u64 {
    500_000
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chain the deployment lives on; part of the EIP-712 domain.
    pub chain_id: u64,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub orders: OrdersConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chain_id",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        let named = self.deployment.named();
        for (i, &(field, address)) in named.iter().enumerate() {
            if address.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be the zero address".to_string(),
                }
                .into());
            }
            if let Some((other, _)) = named[..i].iter().find(|(_, a)| *a == address) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("same address as {other}"),
                }
                .into());
            }
        }

        if self.orders.validity_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "validity_window_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if u32::try_from(self.orders.validity_window_secs).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "validity_window_secs",
                reason: "must fit in a u32 timestamp".to_string(),
            }
            .into());
        }
        if self.orders.default_hook_gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_hook_gas_limit",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.orders.funders.iter().any(|a| a.is_zero()) {
            return Err(ConfigError::InvalidValue {
                field: "funders",
                reason: "must not contain the zero address".to_string(),
            }
            .into());
        }
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: format!("unknown log format '{}'", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
