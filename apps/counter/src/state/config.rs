//! # Configuration State
//!
//! Counter configuration loaded at startup.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     VETPOS_BACKEND_URL=http://10.0.0.5:3000/api                        │
//! │     VETPOS_OFFLINE=true                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $VETPOS_CONFIG, or                                                 │
//! │     ~/.config/vetpos/counter.toml (Linux)                              │
//! │     ~/Library/Application Support/com.vetpos.counter/counter.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # counter.toml
//! store_name = "Clinica Veterinaria San Roque"
//! backend_url = "http://localhost:3000/api"
//! request_timeout_secs = 15
//! offline = false
//! local_currency_code = "VES"
//! local_currency_symbol = "Bs"
//! default_exchange_rate = "36.50"
//! ```
//!
//! ## Thread Safety
//! Read-only after initialization, so no mutex needed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use vetpos_core::{ExchangeRate, Money};

use crate::error::ConfigError;

/// Counter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    /// Store name (shown in the shell banner)
    pub store_name: String,

    /// Base URL of the clinic backend
    pub backend_url: String,

    /// Per-request timeout for backend calls
    pub request_timeout_secs: u64,

    /// Use the in-memory demo backend instead of HTTP
    pub offline: bool,

    /// Symbol of the currency prices are kept in
    pub base_currency_symbol: String,

    /// ISO 4217 code of the local currency
    pub local_currency_code: String,

    pub local_currency_symbol: String,

    /// Rate offered when the operator pays in local currency without
    /// typing one. Decimal string, local units per base unit.
    pub default_exchange_rate: Option<String>,
}

impl Default for ConfigState {
    /// Returns defaults suitable for development.
    ///
    /// ## Default Values
    /// - Backend: `http://localhost:3000/api`, 15 s timeout
    /// - Currencies: `$` base, `Bs` (VES) local, no default rate
    fn default() -> Self {
        ConfigState {
            store_name: "VetPOS Dev Clinic".to_string(),
            backend_url: "http://localhost:3000/api".to_string(),
            request_timeout_secs: 15,
            offline: false,
            base_currency_symbol: "$".to_string(),
            local_currency_code: "VES".to_string(),
            local_currency_symbol: "Bs".to_string(),
            default_exchange_rate: None,
        }
    }
}

impl ConfigState {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`counter.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("VETPOS_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading counter config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Applies `VETPOS_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("VETPOS_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend_url = url;
        }

        if let Ok(timeout) = std::env::var("VETPOS_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid VETPOS_TIMEOUT_SECS"),
            }
        }

        if let Ok(offline) = std::env::var("VETPOS_OFFLINE") {
            self.offline = matches!(offline.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }

        if let Ok(rate) = std::env::var("VETPOS_EXCHANGE_RATE") {
            self.default_exchange_rate = Some(rate);
        }

        if let Ok(name) = std::env::var("VETPOS_STORE_NAME") {
            self.store_name = name;
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.offline && self.backend_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "backend_url is required unless offline".to_string(),
            ));
        }

        if !self.offline
            && !self.backend_url.starts_with("http://")
            && !self.backend_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "backend_url must start with http:// or https://, got: {}",
                self.backend_url
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        self.exchange_rate()?;
        Ok(())
    }

    /// The configured default exchange rate, parsed.
    pub fn exchange_rate(&self) -> Result<Option<ExchangeRate>, ConfigError> {
        let Some(text) = &self.default_exchange_rate else {
            return Ok(None);
        };

        let rate: ExchangeRate = text
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("default_exchange_rate: {}", e)))?;
        if !rate.is_positive() {
            return Err(ConfigError::Invalid(
                "default_exchange_rate must be positive".to_string(),
            ));
        }
        Ok(Some(rate))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "vetpos", "counter")
            .map(|dirs| dirs.config_dir().join("counter.toml"))
    }

    /// Formats an amount in the base currency, e.g. `$12.34`.
    pub fn format_base(&self, amount: Money) -> String {
        format_with_symbol(&self.base_currency_symbol, amount)
    }

    /// Formats an amount in the local currency, e.g. `Bs 1460.00`.
    pub fn format_local(&self, amount: Money) -> String {
        format!("{} {}", self.local_currency_symbol, amount)
    }
}

fn format_with_symbol(symbol: &str, amount: Money) -> String {
    if amount.is_negative() {
        format!("-{}{}", symbol, amount.abs())
    } else {
        format!("{}{}", symbol, amount)
    }
}
