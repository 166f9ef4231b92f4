// src/workflow.rs

use crate::flash::FlashLevel;
use crate::models::OptimizeParams;
use frontier::{
    estimate, sample_frontier, EfficientFrontier, EstimationError, FrontierPoint,
    OptimizationError, Performance, PriceTable,
};
use quote_service::{PriceSource, QuoteError};
use thiserror::Error;
use tracing::{error, info, warn};

/// Failures after validation; `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("No price data found for {ticker}.")]
    NoData { ticker: String },
    #[error("Error fetching data for {ticker}: {reason}")]
    Fetch { ticker: String, reason: String },
    #[error("Not enough historical data. Need at least {min_days} trading days for reliable optimization.")]
    InsufficientHistory { min_days: usize, available: usize },
    #[error("No portfolio can be constructed because all selected assets have expected returns below or equal to the risk-free rate.\n\nSuggestions:\n- Lower the risk-free rate\n- Change the date range to a period with better performance\n- Choose different stocks with higher returns")]
    DegenerateFrontier,
    #[error("Optimization failed: {0}")]
    Optimization(String),
    #[error("Optimization failed: {0}")]
    Estimation(#[from] EstimationError),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl OptimizeError {
    pub fn level(&self) -> FlashLevel {
        match self {
            OptimizeError::DegenerateFrontier => FlashLevel::Warning,
            _ => FlashLevel::Danger,
        }
    }
}

impl From<OptimizationError> for OptimizeError {
    fn from(err: OptimizationError) -> Self {
        match err {
            OptimizationError::NoAssetBeatsRiskFree => OptimizeError::DegenerateFrontier,
            other => OptimizeError::Optimization(other.to_string()),
        }
    }
}

/// Output of a successful optimization, before presentation.
#[derive(Debug, Clone)]
pub struct PortfolioReport {
    /// Cleaned weights in ticker order, as fractions.
    pub weights: Vec<(String, f64)>,
    pub performance: Performance,
    pub frontier: Vec<FrontierPoint>,
}

/// Fetches every ticker in order and aligns the closes on common dates.
///
/// The first failing ticker aborts the whole request.
pub async fn fetch_price_table<P: PriceSource>(
    source: &P,
    params: &OptimizeParams,
    min_days: usize,
) -> Result<PriceTable, OptimizeError> {
    let mut series = Vec::with_capacity(params.tickers.len());
    for ticker in &params.tickers {
        let closes = match source
            .daily_closes(ticker, params.start_date, params.end_date)
            .await
        {
            Ok(closes) if closes.is_empty() => Err(OptimizeError::NoData {
                ticker: ticker.clone(),
            }),
            Ok(closes) => Ok(closes),
            Err(QuoteError::NoData { .. }) => Err(OptimizeError::NoData {
                ticker: ticker.clone(),
            }),
            Err(e) => Err(OptimizeError::Fetch {
                ticker: ticker.clone(),
                reason: e.to_string(),
            }),
        }
        .map_err(|e| {
            warn!(%ticker, error = %e, "price fetch failed");
            e
        })?;
        info!(%ticker, rows = closes.len(), "fetched daily closes");
        series.push((
            ticker.clone(),
            closes.into_iter().map(|bar| (bar.date, bar.close)),
        ));
    }

    let table = PriceTable::align(series);
    if table.len() < min_days {
        warn!(available = table.len(), min_days, "insufficient aligned history");
        return Err(OptimizeError::InsufficientHistory {
            min_days,
            available: table.len(),
        });
    }
    Ok(table)
}

/// Estimates, solves for the tangency portfolio and samples the frontier below it.
pub fn optimize_portfolio(
    table: &PriceTable,
    params: &OptimizeParams,
    trading_days_per_year: u32,
) -> Result<PortfolioReport, OptimizeError> {
    let estimates = estimate(table, trading_days_per_year)?;
    let ef = EfficientFrontier::new(estimates)?;

    let raw = ef.max_sharpe(params.risk_free_rate).map_err(|e| {
        match &e {
            OptimizationError::NoAssetBeatsRiskFree => {
                warn!(risk_free_rate = params.risk_free_rate, "degenerate frontier")
            }
            other => error!(error = %other, "max-Sharpe solve failed"),
        }
        OptimizeError::from(e)
    })?;
    let performance = ef.portfolio_performance(&raw, params.risk_free_rate);
    let weights = ef.clean_weights(&raw);
    let frontier = sample_frontier(
        &ef,
        performance.volatility,
        params.risk_free_rate,
        params.num_simulations,
    );

    info!(
        expected_return = performance.expected_return,
        volatility = performance.volatility,
        sharpe_ratio = performance.sharpe_ratio,
        frontier_points = frontier.len(),
        "optimized portfolio"
    );
    Ok(PortfolioReport {
        weights,
        performance,
        frontier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use quote_service::DailyClose;
    use std::collections::HashMap;

    struct MapSource(HashMap<String, Result<Vec<DailyClose>, String>>);

    impl PriceSource for MapSource {
        async fn daily_closes(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<DailyClose>, QuoteError> {
            match self.0.get(ticker) {
                None => Err(QuoteError::no_data(ticker)),
                Some(Ok(closes)) => Ok(closes.clone()),
                Some(Err(message)) => Err(QuoteError::Api {
                    provider: "test",
                    message: message.clone(),
                }),
            }
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 4).unwrap()
    }

    fn closes(days: usize, drift: f64, wobble: f64) -> Vec<DailyClose> {
        (0..days)
            .map(|t| DailyClose {
                date: start() + Days::new(t as u64),
                close: 20.0 * (drift * t as f64 + wobble * (0.4 * t as f64).sin()).exp(),
            })
            .collect()
    }

    fn params(tickers: &[&str], rf: f64) -> OptimizeParams {
        OptimizeParams {
            risk_free_rate: rf,
            num_simulations: 8,
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            start_date: start(),
            end_date: start() + Days::new(365),
        }
    }

    fn series(days: usize, drift: f64, wobble: f64) -> Vec<(NaiveDate, f64)> {
        closes(days, drift, wobble)
            .into_iter()
            .map(|bar| (bar.date, bar.close))
            .collect()
    }

    #[actix_rt::test]
    async fn test_no_data_and_fetch_errors_are_distinct() {
        let mut map = HashMap::new();
        map.insert("VIC".to_string(), Ok(closes(60, 0.001, 0.02)));
        map.insert("EMPTY".to_string(), Ok(Vec::new()));
        map.insert("BROKEN".to_string(), Err("rate limited".to_string()));
        let source = MapSource(map);

        let err = fetch_price_table(&source, &params(&["VIC", "EMPTY"], 0.02), 30)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No price data found for EMPTY.");

        let err = fetch_price_table(&source, &params(&["VIC", "GONE"], 0.02), 30)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No price data found for GONE.");

        let err = fetch_price_table(&source, &params(&["VIC", "BROKEN"], 0.02), 30)
            .await
            .unwrap_err();
        assert!(matches!(err, OptimizeError::Fetch { .. }));
        assert!(err.to_string().starts_with("Error fetching data for BROKEN: "));
        assert_eq!(err.level(), FlashLevel::Danger);
    }

    #[actix_rt::test]
    async fn test_insufficient_history_after_alignment() {
        let mut map = HashMap::new();
        map.insert("VIC".to_string(), Ok(closes(60, 0.001, 0.02)));
        map.insert("VHM".to_string(), Ok(closes(20, 0.001, 0.03)));
        let source = MapSource(map);

        let err = fetch_price_table(&source, &params(&["VIC", "VHM"], 0.02), 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::InsufficientHistory { min_days: 30, available: 20 }
        ));
        assert_eq!(
            err.to_string(),
            "Not enough historical data. Need at least 30 trading days for reliable optimization."
        );
    }

    #[test]
    fn test_optimize_portfolio_reports_weights_and_frontier() {
        let table = PriceTable::align(vec![
            ("VIC".to_string(), series(200, 0.0010, 0.02)),
            ("VHM".to_string(), series(200, 0.0006, 0.04)),
        ]);

        let report = optimize_portfolio(&table, &params(&["VIC", "VHM"], 0.02), 252).unwrap();

        let total: f64 = report.weights.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-3);
        assert!(report.frontier.len() <= 8);
        assert!(report.performance.volatility > 0.0);
    }

    #[test]
    fn test_degenerate_frontier_is_a_warning() {
        let table = PriceTable::align(vec![
            ("VIC".to_string(), series(100, 0.0001, 0.01)),
            ("VHM".to_string(), series(100, -0.0002, 0.01)),
        ]);

        let err = optimize_portfolio(&table, &params(&["VIC", "VHM"], 0.5), 252).unwrap_err();

        assert!(matches!(err, OptimizeError::DegenerateFrontier));
        assert_eq!(err.level(), FlashLevel::Warning);
        assert!(err.to_string().contains("- Lower the risk-free rate"));
    }
}
