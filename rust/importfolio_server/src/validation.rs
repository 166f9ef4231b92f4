// src/validation.rs

use crate::config::ValidationBounds;
use crate::flash::FlashLevel;
use crate::models::{OptimizeForm, OptimizeParams};
use chrono::NaiveDate;
use thiserror::Error;
use validator::Validate;

const MAX_TICKER_LEN: usize = 10;

/// Input errors; `Display` is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("All fields are required.")]
    MissingFields,
    #[error("Invalid date format.")]
    InvalidDate,
    #[error("Start date must be before or equal to end date.")]
    DateOrder,
    #[error("Number of simulations must be a whole number.")]
    SimulationsNotInteger,
    #[error("Number of simulations must be between {} and {}.", group_thousands(.min), group_thousands(.max))]
    SimulationsOutOfRange { min: usize, max: usize },
    #[error("Invalid ticker symbol: {0}.")]
    InvalidTicker(String),
    #[error("Please enter at least {min} stock tickers.")]
    TooFewTickers { min: usize },
    #[error("Too many stocks. Please limit to {max} tickers for optimal performance.")]
    TooManyTickers { max: usize },
    #[error("Risk-free rate must be a number.")]
    RiskFreeRateNotNumber,
    #[error("Risk-free rate must be between 0 and {max} (enter 2% as 0.02).")]
    RiskFreeRateOutOfRange { max: f64 },
}

impl ValidationError {
    pub fn level(&self) -> FlashLevel {
        match self {
            ValidationError::TooManyTickers { .. } => FlashLevel::Warning,
            _ => FlashLevel::Danger,
        }
    }
}

/// Checks the raw form against `bounds`, in a fixed order, and normalizes it.
pub fn validate_request(
    form: &OptimizeForm,
    bounds: &ValidationBounds,
) -> Result<OptimizeParams, ValidationError> {
    form.validate().map_err(|_| ValidationError::MissingFields)?;

    let start_date = parse_date(&form.start_date)?;
    let end_date = parse_date(&form.end_date)?;
    if start_date > end_date {
        return Err(ValidationError::DateOrder);
    }

    let num_simulations = form
        .num_simulations
        .trim()
        .parse::<usize>()
        .map_err(|_| ValidationError::SimulationsNotInteger)?;
    if num_simulations < bounds.min_simulations || num_simulations > bounds.max_simulations {
        return Err(ValidationError::SimulationsOutOfRange {
            min: bounds.min_simulations,
            max: bounds.max_simulations,
        });
    }

    let tickers = parse_tickers(&form.tickers)?;
    if tickers.len() < bounds.min_tickers {
        return Err(ValidationError::TooFewTickers {
            min: bounds.min_tickers,
        });
    }
    if tickers.len() > bounds.max_tickers {
        return Err(ValidationError::TooManyTickers {
            max: bounds.max_tickers,
        });
    }

    let risk_free_rate = form
        .risk_free_rate
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite())
        .ok_or(ValidationError::RiskFreeRateNotNumber)?;
    if !(0.0..=bounds.max_risk_free_rate).contains(&risk_free_rate) {
        return Err(ValidationError::RiskFreeRateOutOfRange {
            max: bounds.max_risk_free_rate,
        });
    }

    Ok(OptimizeParams {
        risk_free_rate,
        num_simulations,
        tickers,
        start_date,
        end_date,
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate)
}

/// Comma separated, trimmed, uppercased, first occurrence kept.
fn parse_tickers(raw: &str) -> Result<Vec<String>, ValidationError> {
    let mut tickers: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let symbol = symbol.to_ascii_uppercase();
        let well_formed = symbol.len() <= MAX_TICKER_LEN
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !well_formed {
            return Err(ValidationError::InvalidTicker(symbol));
        }
        if !tickers.contains(&symbol) {
            tickers.push(symbol);
        }
    }
    Ok(tickers)
}

fn group_thousands(value: &usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
