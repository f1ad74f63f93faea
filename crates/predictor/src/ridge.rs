//! Closed-form ridge regression.

use ndarray::{Array1, Array2};
use pulse_core::KernelResult;

use crate::linalg::{invert, with_bias_column};

/// Fitted linear weights and intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Solve `theta = (X'X + alpha * I)^-1 X'y` with a leading bias column that
/// is left out of the penalty.
pub fn fit_ridge(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> KernelResult<LinearFit> {
    let d = x.ncols();
    let xb = with_bias_column(x);
    let xt = xb.t();

    let mut gram = xt.dot(&xb);
    let penalty = alpha.max(0.0);
    for i in 1..=d {
        gram[[i, i]] += penalty;
    }

    let theta = invert(&gram)?.dot(&xt.dot(y));
    Ok(LinearFit {
        coefficients: theta.slice(ndarray::s![1..]).to_vec(),
        intercept: theta[0],
    })
}
