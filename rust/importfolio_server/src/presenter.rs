// src/presenter.rs

use crate::chart;
use crate::models::{AllocationData, FrontierData, Metrics, OptimizeParams, ResultsView};
use crate::workflow::PortfolioReport;
use frontier::{FrontierPoint, Performance};
use tracing::warn;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn metrics(performance: &Performance) -> Metrics {
    Metrics {
        exp_return: round2(performance.expected_return * 100.0),
        volatility: round2(performance.volatility * 100.0),
        sharpe_ratio: round2(performance.sharpe_ratio),
    }
}

/// Weights as percentages, in ticker order.
pub fn allocation(weights: &[(String, f64)]) -> AllocationData {
    let (labels, values) = weights
        .iter()
        .map(|(ticker, weight)| (ticker.clone(), round2(weight * 100.0)))
        .unzip();
    AllocationData { labels, values }
}

pub fn frontier_data(points: &[FrontierPoint]) -> FrontierData {
    FrontierData {
        returns: points.iter().map(|p| p.expected_return).collect(),
        vols: points.iter().map(|p| p.volatility).collect(),
    }
}

/// Assembles the results page model, including both chart renderings.
pub fn build_results(params: &OptimizeParams, report: &PortfolioReport) -> ResultsView {
    let metrics = metrics(&report.performance);
    let frontier_data = frontier_data(&report.frontier);
    let allocation_data = allocation(&report.weights);

    let figure = chart::FrontierFigure {
        frontier: &frontier_data,
        optimal: &metrics,
        risk_free_rate: params.risk_free_rate,
    };
    let efficient_frontier_svg = match chart::frontier_svg(&figure) {
        Ok(svg) => Some(svg),
        Err(e) => {
            warn!(error = %e, "static frontier chart omitted");
            None
        }
    };

    ResultsView {
        tickers: params.tickers.clone(),
        start_date: params.start_date,
        end_date: params.end_date,
        risk_free_rate: params.risk_free_rate,
        efficient_frontier_html: chart::frontier_html(&figure),
        allocation_html: chart::allocation_html(&allocation_data),
        efficient_frontier_svg,
        metrics,
        frontier_data,
        allocation_data,
    }
}
