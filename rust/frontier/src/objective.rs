// src/objective.rs
//
// Objective and constraint callbacks in the shape nlopt expects:
// `f(x, grad, user_data) -> value`, filling `grad` when it is requested.

use ndarray::{Array1, Array2, ArrayView1};

/// Data for the `wᵀΣw ≤ σ²` inequality constraint.
pub struct VarianceCap {
    pub covariance: Array2<f64>,
    pub max_variance: f64,
}

pub fn portfolio_variance(w: &[f64], grad: Option<&mut [f64]>, covariance: &mut Array2<f64>) -> f64 {
    let w = ArrayView1::from(w);
    let sigma_w = covariance.dot(&w);

    if let Some(grad) = grad {
        for (g, s) in grad.iter_mut().zip(sigma_w.iter()) {
            *g = 2.0 * s;
        }
    }

    w.dot(&sigma_w)
}

pub fn expected_return(
    w: &[f64],
    grad: Option<&mut [f64]>,
    expected_returns: &mut Array1<f64>,
) -> f64 {
    if let Some(grad) = grad {
        for (g, mu) in grad.iter_mut().zip(expected_returns.iter()) {
            *g = *mu;
        }
    }
    ArrayView1::from(w).dot(&*expected_returns)
}

/// Σw − 1 = 0
pub fn fully_invested(w: &[f64], grad: Option<&mut [f64]>, _user_data: &mut ()) -> f64 {
    if let Some(grad) = grad {
        for g in grad.iter_mut() {
            *g = 1.0;
        }
    }
    w.iter().sum::<f64>() - 1.0
}

/// (μ − r_f)ᵀy − 1 = 0, the normalisation of the max-Sharpe transform.
pub fn unit_excess_return(y: &[f64], grad: Option<&mut [f64]>, excess: &mut Array1<f64>) -> f64 {
    if let Some(grad) = grad {
        for (g, e) in grad.iter_mut().zip(excess.iter()) {
            *g = *e;
        }
    }
    ArrayView1::from(y).dot(&*excess) - 1.0
}

pub fn variance_cap(w: &[f64], grad: Option<&mut [f64]>, cap: &mut VarianceCap) -> f64 {
    portfolio_variance(w, grad, &mut cap.covariance) - cap.max_variance
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_portfolio_variance_and_gradient() {
        let mut cov = array![[0.04, 0.01], [0.01, 0.09]];
        let w = [0.5, 0.5];
        let mut grad = [0.0; 2];

        let value = portfolio_variance(&w, Some(&mut grad), &mut cov);

        let expected = 0.25 * 0.04 + 2.0 * 0.25 * 0.01 + 0.25 * 0.09;
        assert!((value - expected).abs() < 1e-12);
        assert!((grad[0] - 2.0 * (0.5 * 0.04 + 0.5 * 0.01)).abs() < 1e-12);
        assert!((grad[1] - 2.0 * (0.5 * 0.01 + 0.5 * 0.09)).abs() < 1e-12);
    }

    #[test]
    fn test_portfolio_variance_gradient_matches_finite_difference() {
        let mut cov = array![[0.04, 0.006, 0.002], [0.006, 0.09, 0.003], [0.002, 0.003, 0.01]];
        let w = [0.2, 0.3, 0.5];
        let mut grad = [0.0; 3];
        let value = portfolio_variance(&w, Some(&mut grad), &mut cov);

        let eps = 1e-7;
        for i in 0..w.len() {
            let mut w_eps = w;
            w_eps[i] += eps;
            let numeric = (portfolio_variance(&w_eps, None, &mut cov) - value) / eps;
            assert!((numeric - grad[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_linear_constraints() {
        let mut mu = array![0.10, 0.05];
        let mut grad = [0.0; 2];

        let ret = expected_return(&[0.4, 0.6], Some(&mut grad), &mut mu);
        assert!((ret - 0.07).abs() < 1e-12);
        assert_eq!(grad, [0.10, 0.05]);

        assert!((fully_invested(&[0.4, 0.6], None, &mut ())).abs() < 1e-12);

        let mut excess = array![0.08, 0.03];
        let value = unit_excess_return(&[10.0, 5.0], Some(&mut grad), &mut excess);
        assert!((value - (0.8 + 0.15 - 1.0)).abs() < 1e-12);
        assert_eq!(grad, [0.08, 0.03]);
    }

    #[test]
    fn test_variance_cap_is_negative_inside_the_cap() {
        let mut cap = VarianceCap {
            covariance: array![[0.04, 0.0], [0.0, 0.01]],
            max_variance: 0.15 * 0.15,
        };
        assert!(variance_cap(&[0.5, 0.5], None, &mut cap) < 0.0);
        assert!(variance_cap(&[1.0, 0.0], None, &mut cap) > 0.0);
    }
}
