// src/optimizer.rs

use crate::error::OptimizationError;
use crate::estimate::ReturnEstimates;
use crate::objective::{
    expected_return, fully_invested, portfolio_variance, unit_excess_return, variance_cap,
    VarianceCap,
};
use ndarray::{Array1, Array2, ArrayView1};
use nlopt::{Algorithm, FailState, Nlopt, SuccessState, Target};
use ordered_float::OrderedFloat;
use tracing::debug;

/// Weights with an absolute value below this are cleaned to zero.
pub const WEIGHT_CUTOFF: f64 = 1e-4;
/// Decimal places kept by [`EfficientFrontier::clean_weights`].
pub const WEIGHT_ROUNDING: i32 = 5;

const MAX_EVALUATIONS: u32 = 2_000;
const CONSTRAINT_TOLERANCE: f64 = 1e-10;
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Performance {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Long-only, fully invested mean-variance optimizer over a fixed set of
/// annualized estimates. Every solve is independent; nothing is cached.
#[derive(Debug, Clone)]
pub struct EfficientFrontier {
    tickers: Vec<String>,
    expected_returns: Array1<f64>,
    covariance: Array2<f64>,
}

impl EfficientFrontier {
    pub fn new(estimates: ReturnEstimates) -> Result<Self, OptimizationError> {
        let ReturnEstimates {
            tickers,
            expected_returns,
            covariance,
        } = estimates;

        let n = expected_returns.len();
        let (rows, cols) = covariance.dim();
        if rows != n || cols != n || tickers.len() != n {
            return Err(OptimizationError::DimensionMismatch {
                returns: n,
                rows,
                cols,
            });
        }
        if expected_returns.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(OptimizationError::Solver(
                "expected returns or covariance contain non-finite values".to_string(),
            ));
        }

        Ok(EfficientFrontier {
            tickers,
            expected_returns,
            covariance,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn n_assets(&self) -> usize {
        self.tickers.len()
    }

    /// Weights maximizing `(μᵀw − r_f) / √(wᵀΣw)`.
    ///
    /// Solved in the convex form `min yᵀΣy  s.t. (μ − r_f)ᵀy = 1, y ≥ 0`,
    /// with `w = y / Σy`.
    pub fn max_sharpe(&self, risk_free_rate: f64) -> Result<Vec<f64>, OptimizationError> {
        let n = self.n_assets();
        let excess = &self.expected_returns - risk_free_rate;

        let (best, best_excess) = excess
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, e)| OrderedFloat(*e))
            .filter(|(_, e)| *e > 0.0)
            .ok_or(OptimizationError::NoAssetBeatsRiskFree)?;

        let mut opt = Nlopt::new(
            Algorithm::Slsqp,
            n,
            portfolio_variance,
            Target::Minimize,
            self.covariance.clone(),
        );
        opt.set_lower_bounds(&vec![0.0; n]).map_err(setup_failed)?;
        opt.add_equality_constraint(unit_excess_return, excess, CONSTRAINT_TOLERANCE)
            .map_err(setup_failed)?;
        configure_stopping(&mut opt)?;

        // All capital in the asset with the largest excess return is feasible.
        let mut y = vec![0.0; n];
        y[best] = 1.0 / best_excess;
        accept(opt.optimize(&mut y))?;
        self.check_unit_excess(&y, risk_free_rate)?;

        let scale: f64 = y.iter().map(|v| v.max(0.0)).sum();
        if !(scale.is_finite() && scale > 0.0) {
            return Err(OptimizationError::Infeasible(format!(
                "max-Sharpe solution has non-positive scale {}",
                scale
            )));
        }
        Ok(y.iter().map(|v| v.max(0.0) / scale).collect())
    }

    /// Weights minimizing `wᵀΣw`.
    pub fn min_volatility(&self) -> Result<Vec<f64>, OptimizationError> {
        let n = self.n_assets();
        let mut opt = Nlopt::new(
            Algorithm::Slsqp,
            n,
            portfolio_variance,
            Target::Minimize,
            self.covariance.clone(),
        );
        set_weight_bounds(&mut opt, n)?;
        opt.add_equality_constraint(fully_invested, (), CONSTRAINT_TOLERANCE)
            .map_err(setup_failed)?;
        configure_stopping(&mut opt)?;

        let mut w = vec![1.0 / n as f64; n];
        accept(opt.optimize(&mut w))?;
        self.check_feasible(normalize(w), None)
    }

    /// Weights maximizing `μᵀw` subject to `√(wᵀΣw) ≤ target_volatility`.
    pub fn efficient_risk(&self, target_volatility: f64) -> Result<Vec<f64>, OptimizationError> {
        if !(target_volatility.is_finite() && target_volatility >= 0.0) {
            return Err(OptimizationError::InvalidTarget(target_volatility));
        }

        let start = self.min_volatility()?;
        let min_volatility = self.variance(&start).sqrt();
        if target_volatility < min_volatility {
            return Err(OptimizationError::BelowMinimumVolatility {
                min_volatility,
                target_volatility,
            });
        }

        let n = self.n_assets();
        let max_variance = target_volatility * target_volatility;
        let mut opt = Nlopt::new(
            Algorithm::Slsqp,
            n,
            expected_return,
            Target::Maximize,
            self.expected_returns.clone(),
        );
        set_weight_bounds(&mut opt, n)?;
        opt.add_equality_constraint(fully_invested, (), CONSTRAINT_TOLERANCE)
            .map_err(setup_failed)?;
        opt.add_inequality_constraint(
            variance_cap,
            VarianceCap {
                covariance: self.covariance.clone(),
                max_variance,
            },
            CONSTRAINT_TOLERANCE,
        )
        .map_err(setup_failed)?;
        configure_stopping(&mut opt)?;

        // The minimum-volatility portfolio satisfies the cap, so start there.
        let mut w = start;
        accept(opt.optimize(&mut w))?;
        self.check_feasible(normalize(w), Some(max_variance))
    }

    pub fn portfolio_performance(&self, weights: &[f64], risk_free_rate: f64) -> Performance {
        let expected_return = ArrayView1::from(weights).dot(&self.expected_returns);
        let volatility = self.variance(weights).sqrt();
        let sharpe_ratio = if volatility > 0.0 {
            (expected_return - risk_free_rate) / volatility
        } else {
            0.0
        };
        Performance {
            expected_return,
            volatility,
            sharpe_ratio,
        }
    }

    /// Zeroes weights below [`WEIGHT_CUTOFF`] and rounds the rest to
    /// [`WEIGHT_ROUNDING`] decimals, keyed by ticker.
    pub fn clean_weights(&self, weights: &[f64]) -> Vec<(String, f64)> {
        let scale = 10f64.powi(WEIGHT_ROUNDING);
        self.tickers
            .iter()
            .zip(weights)
            .map(|(ticker, &w)| {
                let w = if w.abs() < WEIGHT_CUTOFF { 0.0 } else { w };
                (ticker.clone(), (w * scale).round() / scale)
            })
            .collect()
    }

    fn variance(&self, weights: &[f64]) -> f64 {
        let w = ArrayView1::from(weights);
        w.dot(&self.covariance.dot(&w))
    }

    // The scaled tangency solution must satisfy `(μ − r_f)ᵀy = 1` with `y ≥ 0`.
    fn check_unit_excess(&self, y: &[f64], risk_free_rate: f64) -> Result<(), OptimizationError> {
        if y.iter().any(|v| !v.is_finite() || *v < -FEASIBILITY_TOLERANCE) {
            return Err(OptimizationError::Infeasible(
                "max-Sharpe solution has negative or non-finite holdings".to_string(),
            ));
        }
        let excess: f64 = y
            .iter()
            .zip(self.expected_returns.iter())
            .map(|(y, mu)| y * (mu - risk_free_rate))
            .sum();
        if (excess - 1.0).abs() > FEASIBILITY_TOLERANCE {
            return Err(OptimizationError::Infeasible(format!(
                "scaled excess return is {:.6}, expected 1",
                excess
            )));
        }
        Ok(())
    }

    fn check_feasible(
        &self,
        w: Vec<f64>,
        max_variance: Option<f64>,
    ) -> Result<Vec<f64>, OptimizationError> {
        let total: f64 = w.iter().sum();
        if w.iter().any(|v| !v.is_finite()) || (total - 1.0).abs() > FEASIBILITY_TOLERANCE {
            return Err(OptimizationError::Infeasible(format!(
                "weights sum to {:.6}",
                total
            )));
        }
        if let Some(max_variance) = max_variance {
            let variance = self.variance(&w);
            if variance > max_variance * (1.0 + FEASIBILITY_TOLERANCE) + 1e-12 {
                return Err(OptimizationError::Infeasible(format!(
                    "volatility {:.6} exceeds target {:.6}",
                    variance.sqrt(),
                    max_variance.sqrt()
                )));
            }
        }
        Ok(w)
    }
}

fn setup_failed(state: FailState) -> OptimizationError {
    OptimizationError::Solver(format!("failed to configure solver: {:?}", state))
}

fn set_weight_bounds<F, T>(opt: &mut Nlopt<F, T>, n: usize) -> Result<(), OptimizationError>
where
    F: nlopt::ObjFn<T>,
{
    opt.set_lower_bounds(&vec![0.0; n]).map_err(setup_failed)?;
    opt.set_upper_bounds(&vec![1.0; n]).map_err(setup_failed)?;
    Ok(())
}

fn configure_stopping<F, T>(opt: &mut Nlopt<F, T>) -> Result<(), OptimizationError>
where
    F: nlopt::ObjFn<T>,
{
    opt.set_xtol_rel(1e-10).map_err(setup_failed)?;
    opt.set_ftol_rel(1e-12).map_err(setup_failed)?;
    opt.set_maxeval(MAX_EVALUATIONS).map_err(setup_failed)?;
    Ok(())
}

// SLSQP often stops with RoundoffLimited once it is already at the optimum;
// the caller's feasibility check decides whether the point is usable.
fn accept(result: Result<(SuccessState, f64), (FailState, f64)>) -> Result<(), OptimizationError> {
    match result {
        Ok((state, value)) => {
            debug!(?state, value, "solver finished");
            Ok(())
        }
        Err((FailState::RoundoffLimited, value)) => {
            debug!(value, "solver stopped on roundoff");
            Ok(())
        }
        Err((state, _)) => Err(OptimizationError::Solver(format!("{:?}", state))),
    }
}

// Clip solver noise below zero and rescale to a fully invested portfolio.
fn normalize(w: Vec<f64>) -> Vec<f64> {
    let clipped: Vec<f64> = w.into_iter().map(|v| v.max(0.0)).collect();
    let total: f64 = clipped.iter().sum();
    if total > 0.0 {
        clipped.into_iter().map(|v| v / total).collect()
    } else {
        clipped
    }
}
