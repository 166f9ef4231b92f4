// src/sampling.rs

use crate::error::OptimizationError;
use crate::optimizer::EfficientFrontier;
use tracing::debug;

/// One sampled frontier portfolio, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierPoint {
    pub volatility: f64,
    pub expected_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Feasible(FrontierPoint),
    Infeasible {
        target_volatility: f64,
        error: OptimizationError,
    },
}

/// `simulations` evenly spaced multiples of `optimal_volatility` over `[0, 1]`.
pub fn volatility_grid(optimal_volatility: f64, simulations: usize) -> Vec<f64> {
    match simulations {
        0 => Vec::new(),
        1 => vec![0.0],
        n => (0..n)
            .map(|i| optimal_volatility * (i as f64 / (n - 1) as f64))
            .collect(),
    }
}

pub fn sample_point(
    frontier: &EfficientFrontier,
    target_volatility: f64,
    risk_free_rate: f64,
) -> SampleOutcome {
    match frontier.efficient_risk(target_volatility) {
        Ok(weights) => {
            let perf = frontier.portfolio_performance(&weights, risk_free_rate);
            SampleOutcome::Feasible(FrontierPoint {
                volatility: perf.volatility * 100.0,
                expected_return: perf.expected_return * 100.0,
            })
        }
        Err(error) => SampleOutcome::Infeasible {
            target_volatility,
            error,
        },
    }
}

/// Approximates the efficient frontier below `optimal_volatility`.
///
/// Each grid point is an independent efficient-risk solve; targets the solver
/// cannot reach are skipped, so the result may be shorter than `simulations`.
pub fn sample_frontier(
    frontier: &EfficientFrontier,
    optimal_volatility: f64,
    risk_free_rate: f64,
    simulations: usize,
) -> Vec<FrontierPoint> {
    volatility_grid(optimal_volatility, simulations)
        .into_iter()
        .filter_map(
            |target| match sample_point(frontier, target, risk_free_rate) {
                SampleOutcome::Feasible(point) => Some(point),
                SampleOutcome::Infeasible {
                    target_volatility,
                    error,
                } => {
                    debug!(target_volatility, %error, "skipping frontier sample");
                    None
                }
            },
        )
        .collect()
}
