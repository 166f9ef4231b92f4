// src/models.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Raw `POST /optimize` form. Every field must be present and non-empty.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct OptimizeForm {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub risk_free_rate: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub num_simulations: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub tickers: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub start_date: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub end_date: String,
}

/// Validated request parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeParams {
    /// Annual rate as a fraction: 0.02 is 2%.
    pub risk_free_rate: f64,
    pub num_simulations: usize,
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub exp_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierData {
    pub returns: Vec<f64>,
    pub vols: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Everything the results template needs.
#[derive(Debug, Clone)]
pub struct ResultsView {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub risk_free_rate: f64,
    pub metrics: Metrics,
    pub frontier_data: FrontierData,
    pub allocation_data: AllocationData,
    pub efficient_frontier_html: String,
    pub allocation_html: String,
    pub efficient_frontier_svg: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}
