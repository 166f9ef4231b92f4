// src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("need at least {required} daily returns, got {available}")]
    TooFewObservations { required: usize, available: usize },
    #[error("price for {ticker} on {date} is not a positive number")]
    NonPositivePrice { ticker: String, date: NaiveDate },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizationError {
    #[error("at least one of the assets must have an expected return exceeding the risk-free rate")]
    NoAssetBeatsRiskFree,
    #[error("The minimum volatility is {min_volatility:.3}. Please use a higher target_volatility")]
    BelowMinimumVolatility {
        min_volatility: f64,
        target_volatility: f64,
    },
    #[error("target volatility must be a non-negative number, got {0}")]
    InvalidTarget(f64),
    #[error("expected returns ({returns}) and covariance ({rows}x{cols}) dimensions disagree")]
    DimensionMismatch {
        returns: usize,
        rows: usize,
        cols: usize,
    },
    #[error("solver did not produce a feasible portfolio: {0}")]
    Infeasible(String),
    #[error("solver failed: {0}")]
    Solver(String),
}
