// src/estimate.rs

use crate::error::EstimationError;
use crate::table::PriceTable;
use ndarray::{Array1, Array2, Axis};

pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Annualized inputs to the mean-variance optimizer.
#[derive(Debug, Clone)]
pub struct ReturnEstimates {
    pub tickers: Vec<String>,
    pub expected_returns: Array1<f64>,
    pub covariance: Array2<f64>,
}

/// Simple daily returns, one row per consecutive pair of trading days.
pub fn daily_returns(prices: &PriceTable) -> Result<Array2<f64>, EstimationError> {
    for (date, row) in prices.dates().iter().zip(prices.rows()) {
        if let Some(column) = row.iter().position(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(EstimationError::NonPositivePrice {
                ticker: prices.tickers()[column].clone(),
                date: *date,
            });
        }
    }

    let observations = prices.len().saturating_sub(1);
    if observations < 2 {
        return Err(EstimationError::TooFewObservations {
            required: 2,
            available: observations,
        });
    }

    let rows = prices.rows();
    Ok(Array2::from_shape_fn(
        (observations, prices.tickers().len()),
        |(t, i)| rows[t + 1][i] / rows[t][i] - 1.0,
    ))
}

/// Compounded (geometric) mean return, annualized by `frequency` periods per year.
pub fn mean_historical_return(returns: &Array2<f64>, frequency: u32) -> Array1<f64> {
    let count = returns.nrows() as f64;
    returns.map_axis(Axis(0), |column| {
        let growth: f64 = column.iter().map(|r| 1.0 + r).product();
        growth.powf(frequency as f64 / count) - 1.0
    })
}

/// Sample covariance (ddof = 1) of the returns, annualized by `frequency`.
pub fn sample_cov(returns: &Array2<f64>, frequency: u32) -> Array2<f64> {
    let n = returns.nrows();
    let means = returns
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(returns.ncols()));
    let centered = returns - &means;
    let cov = centered.t().dot(&centered) / (n as f64 - 1.0) * frequency as f64;
    // Symmetrize to remove floating point asymmetry from the product.
    (&cov + &cov.t()) / 2.0
}

pub fn estimate(prices: &PriceTable, frequency: u32) -> Result<ReturnEstimates, EstimationError> {
    let returns = daily_returns(prices)?;
    Ok(ReturnEstimates {
        tickers: prices.tickers().to_vec(),
        expected_returns: mean_historical_return(&returns, frequency),
        covariance: sample_cov(&returns, frequency),
    })
}
