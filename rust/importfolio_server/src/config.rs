// src/config.rs
//
// Runtime configuration from environment variables. Every value has a default;
// the resulting `AppConfig` is immutable and shared with handlers via `web::Data`.

use quote_service::Provider;
use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

pub const MIN_SIMULATIONS: usize = 1;
pub const MAX_SIMULATIONS: usize = 10_000;
pub const MIN_TICKERS: usize = 2;
pub const MAX_TICKERS: usize = 10;
pub const MIN_HISTORICAL_DAYS: usize = 30;
pub const MAX_RISK_FREE_RATE: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid validation bounds: {0}")]
    InvalidBounds(String),
    #[error(transparent)]
    Provider(#[from] quote_service::QuoteError),
}

/// Limits applied to user input, mirrored to the browser by
/// `GET /validation-constants`.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ValidationBounds {
    #[validate(range(min = 1))]
    pub min_simulations: usize,
    #[validate(range(min = 1))]
    pub max_simulations: usize,
    #[validate(range(min = 2))]
    pub min_tickers: usize,
    #[validate(range(min = 2))]
    pub max_tickers: usize,
    // Two returns are needed for a sample covariance, so three prices.
    #[validate(range(min = 3))]
    pub min_historical_days: usize,
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_risk_free_rate: f64,
}

impl Default for ValidationBounds {
    fn default() -> Self {
        ValidationBounds {
            min_simulations: MIN_SIMULATIONS,
            max_simulations: MAX_SIMULATIONS,
            min_tickers: MIN_TICKERS,
            max_tickers: MAX_TICKERS,
            min_historical_days: MIN_HISTORICAL_DAYS,
            max_risk_free_rate: MAX_RISK_FREE_RATE,
        }
    }
}

impl ValidationBounds {
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()
            .map_err(|errors| ConfigError::InvalidBounds(errors.to_string()))?;
        if self.min_simulations > self.max_simulations {
            return Err(ConfigError::InvalidBounds(
                "min_simulations exceeds max_simulations".to_string(),
            ));
        }
        if self.min_tickers > self.max_tickers {
            return Err(ConfigError::InvalidBounds(
                "min_tickers exceeds max_tickers".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub quote_provider: Provider,
    pub quote_base_url: Option<String>,
    pub alphavantage_api_key: String,
    pub quote_timeout: Duration,
    pub trading_days_per_year: u32,
    pub bounds: ValidationBounds,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            quote_provider: Provider::Vci,
            quote_base_url: None,
            alphavantage_api_key: "demo".to_string(),
            quote_timeout: Duration::from_secs(30),
            trading_days_per_year: frontier::TRADING_DAYS_PER_YEAR,
            bounds: ValidationBounds::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let bounds = ValidationBounds {
            min_simulations: parsed(&lookup, "IMPORTFOLIO_MIN_SIMULATIONS", defaults.bounds.min_simulations)?,
            max_simulations: parsed(&lookup, "IMPORTFOLIO_MAX_SIMULATIONS", defaults.bounds.max_simulations)?,
            min_tickers: parsed(&lookup, "IMPORTFOLIO_MIN_TICKERS", defaults.bounds.min_tickers)?,
            max_tickers: parsed(&lookup, "IMPORTFOLIO_MAX_TICKERS", defaults.bounds.max_tickers)?,
            min_historical_days: parsed(
                &lookup,
                "IMPORTFOLIO_MIN_HISTORICAL_DAYS",
                defaults.bounds.min_historical_days,
            )?,
            max_risk_free_rate: parsed(
                &lookup,
                "IMPORTFOLIO_MAX_RISK_FREE_RATE",
                defaults.bounds.max_risk_free_rate,
            )?,
        };
        bounds.check()?;

        let quote_provider = match lookup("IMPORTFOLIO_QUOTE_PROVIDER") {
            Some(value) => value.parse::<Provider>()?,
            None => defaults.quote_provider,
        };

        let trading_days_per_year =
            parsed(&lookup, "IMPORTFOLIO_TRADING_DAYS", defaults.trading_days_per_year)?;
        if trading_days_per_year == 0 {
            return Err(ConfigError::InvalidValue {
                key: "IMPORTFOLIO_TRADING_DAYS",
                value: "0".to_string(),
            });
        }

        Ok(AppConfig {
            bind_address: lookup("IMPORTFOLIO_BIND").unwrap_or(defaults.bind_address),
            quote_provider,
            quote_base_url: lookup("IMPORTFOLIO_QUOTE_BASE_URL").filter(|url| !url.is_empty()),
            alphavantage_api_key: lookup("IMPORTFOLIO_ALPHAVANTAGE_KEY")
                .unwrap_or(defaults.alphavantage_api_key),
            quote_timeout: Duration::from_secs(parsed(
                &lookup,
                "IMPORTFOLIO_QUOTE_TIMEOUT_SECS",
                defaults.quote_timeout.as_secs(),
            )?),
            trading_days_per_year,
            bounds,
        })
    }
}

fn parsed<L, T>(lookup: &L, key: &'static str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}
