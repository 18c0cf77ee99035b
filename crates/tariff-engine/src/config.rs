//! # Engine Configuration
//!
//! Configuration management for the pricing engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TARIFF_DEFAULT_CURRENCY=EUR                                        │
//! │     TARIFF_TIMEOUT_MS=1500                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tariff/tariff.toml (Linux)                               │
//! │     ~/Library/Application Support/com.tariff.tariff/tariff.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     CHF, Swiss VAT table, 5 Rappen rounding                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [engine]
//! default_currency = "CHF"
//! default_country = "CH"
//! invocation_timeout_ms = 2000
//!
//! [fx]
//! cache_ttl_secs = 60
//! lookup_timeout_ms = 500
//!
//! [rounding]
//! CHF = 5
//!
//! [[tax.countries]]
//! country_code = "CH"
//! rates = [
//!     { category = "standard", rate = "0.077" },
//!     { category = "standard", rate = "0.081", valid_from = "2024-01-01" },
//!     { category = "reduced", rate = "0.026", valid_from = "2024-01-01" },
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tariff_core::types::TaxRate;
use tariff_core::validation::validate_currency_code;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Engine Settings
// =============================================================================

/// Invocation behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Currency used when a request does not name one.
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Country used for tax when an order or provider does not name one.
    #[serde(default = "default_country")]
    pub default_country: String,

    /// Upper bound for one full Director invocation (milliseconds).
    #[serde(default = "default_invocation_timeout")]
    pub invocation_timeout_ms: u64,
}

fn default_currency() -> String {
    tariff_core::DEFAULT_CURRENCY.to_string()
}

fn default_country() -> String {
    "CH".to_string()
}

fn default_invocation_timeout() -> u64 {
    2000
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            default_currency: default_currency(),
            default_country: default_country(),
            invocation_timeout_ms: default_invocation_timeout(),
        }
    }
}

// =============================================================================
// FX Settings
// =============================================================================

/// Exchange rate cache behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxSettings {
    /// How long a fetched rate is reused (seconds). The provider's own
    /// expiry wins when it is earlier.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// A provider slower than this counts as a cache miss (milliseconds).
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_ms: u64,
}

fn default_cache_ttl() -> u64 {
    60
}

fn default_lookup_timeout() -> u64 {
    500
}

impl Default for FxSettings {
    fn default() -> Self {
        FxSettings {
            cache_ttl_secs: default_cache_ttl(),
            lookup_timeout_ms: default_lookup_timeout(),
        }
    }
}

// =============================================================================
// Tax Tables
// =============================================================================

/// Which rate of a country table applies to a product or provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxCategory {
    #[default]
    Standard,
    Reduced,
    Special,
}

impl std::fmt::Display for TaxCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxCategory::Standard => write!(f, "standard"),
            TaxCategory::Reduced => write!(f, "reduced"),
            TaxCategory::Special => write!(f, "special"),
        }
    }
}

/// One rate of a country, optionally valid only from a date on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateEntry {
    #[serde(default)]
    pub category: TaxCategory,

    pub rate: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
}

impl TaxRateEntry {
    fn applies_on(&self, date: NaiveDate) -> bool {
        self.valid_from.map_or(true, |from| from <= date)
    }
}

/// All rates of one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTaxTable {
    pub country_code: String,

    #[serde(default)]
    pub rates: Vec<TaxRateEntry>,
}

impl CountryTaxTable {
    /// The rate of `category` in force on `date`.
    ///
    /// ## Time Boundaries
    /// ```text
    /// standard 0.077                        (no valid_from: always)
    /// standard 0.081  valid_from 2024-01-01
    ///
    /// 2023-12-31 → 0.077      2024-01-01 → 0.081
    /// ```
    /// The entry with the latest `valid_from` not after `date` wins.
    pub fn rate_for(&self, category: TaxCategory, date: NaiveDate) -> Option<TaxRate> {
        self.rates
            .iter()
            .filter(|entry| entry.category == category && entry.applies_on(date))
            .max_by_key(|entry| entry.valid_from)
            .map(|entry| TaxRate::new(entry.rate))
    }
}

/// Per-country tax tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSettings {
    #[serde(default = "default_countries")]
    pub countries: Vec<CountryTaxTable>,
}

fn default_countries() -> Vec<CountryTaxTable> {
    let switch = NaiveDate::from_ymd_opt(2024, 1, 1);
    let entry = |category, rate, valid_from| TaxRateEntry {
        category,
        rate,
        valid_from,
    };
    vec![
        CountryTaxTable {
            country_code: "CH".to_string(),
            rates: vec![
                entry(TaxCategory::Standard, Decimal::new(77, 3), None),
                entry(TaxCategory::Reduced, Decimal::new(25, 3), None),
                entry(TaxCategory::Special, Decimal::new(37, 3), None),
                entry(TaxCategory::Standard, Decimal::new(81, 3), switch),
                entry(TaxCategory::Reduced, Decimal::new(26, 3), switch),
                entry(TaxCategory::Special, Decimal::new(38, 3), switch),
            ],
        },
        CountryTaxTable {
            country_code: "DE".to_string(),
            rates: vec![
                entry(TaxCategory::Standard, Decimal::new(19, 2), None),
                entry(TaxCategory::Reduced, Decimal::new(7, 2), None),
            ],
        },
    ]
}

impl Default for TaxSettings {
    fn default() -> Self {
        TaxSettings {
            countries: default_countries(),
        }
    }
}

impl TaxSettings {
    pub fn country(&self, country_code: &str) -> Option<&CountryTaxTable> {
        self.countries
            .iter()
            .find(|table| table.country_code.eq_ignore_ascii_case(country_code))
    }
}

fn default_rounding() -> BTreeMap<String, i64> {
    BTreeMap::from([("CHF".to_string(), 5)])
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub fx: FxSettings,

    /// Rounding increment in minor units per currency (`CHF = 5`).
    /// Currencies not listed are not rounded.
    #[serde(default = "default_rounding")]
    pub rounding: BTreeMap<String, i64>,

    #[serde(default)]
    pub tax: TaxSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            engine: EngineSettings::default(),
            fx: FxSettings::default(),
            rounding: default_rounding(),
            tax: TaxSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tariff.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
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

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses and validates a TOML document without touching the environment.
    pub fn from_toml_str(contents: &str) -> EngineResult<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        validate_currency_code(&self.engine.default_currency)
            .map_err(|e| EngineError::Config(format!("engine.default_currency: {}", e)))?;

        if self.engine.invocation_timeout_ms == 0 {
            return Err(EngineError::Config(
                "invocation_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.fx.lookup_timeout_ms == 0 {
            return Err(EngineError::Config(
                "fx.lookup_timeout_ms must be greater than 0".into(),
            ));
        }

        for (currency, increment) in &self.rounding {
            validate_currency_code(currency)
                .map_err(|e| EngineError::Config(format!("rounding: {}", e)))?;
            if *increment <= 0 {
                return Err(EngineError::Config(format!(
                    "rounding increment for {} must be greater than 0",
                    currency
                )));
            }
        }

        for table in &self.tax.countries {
            if table.country_code.trim().is_empty() {
                return Err(EngineError::Config("tax country_code is required".into()));
            }
            if let Some(entry) = table.rates.iter().find(|e| e.rate.is_sign_negative()) {
                return Err(EngineError::Config(format!(
                    "negative {} tax rate for {}",
                    entry.category, table.country_code
                )));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(currency) = std::env::var("TARIFF_DEFAULT_CURRENCY") {
            debug!(currency = %currency, "Overriding default currency from environment");
            self.engine.default_currency = currency;
        }

        if let Ok(country) = std::env::var("TARIFF_DEFAULT_COUNTRY") {
            self.engine.default_country = country;
        }

        if let Ok(timeout) = std::env::var("TARIFF_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.engine.invocation_timeout_ms = ms,
                Err(_) => warn!(value = %timeout, "Ignoring invalid TARIFF_TIMEOUT_MS"),
            }
        }

        if let Ok(ttl) = std::env::var("TARIFF_FX_TTL_SECS") {
            if let Ok(secs) = ttl.parse::<u64>() {
                self.fx.cache_ttl_secs = secs;
            }
        }

        if let Ok(timeout) = std::env::var("TARIFF_FX_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                self.fx.lookup_timeout_ms = ms;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tariff", "tariff")
            .map(|dirs| dirs.config_dir().join("tariff.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.invocation_timeout_ms)
    }

    pub fn fx_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.fx.cache_ttl_secs)
    }

    pub fn fx_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.fx.lookup_timeout_ms)
    }

    /// Rounding increment for a currency, if configured.
    pub fn rounding_increment(&self, currency_code: &str) -> Option<i64> {
        self.rounding.get(currency_code).copied()
    }
}
