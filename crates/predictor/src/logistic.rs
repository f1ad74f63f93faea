//! Logistic regression by batch gradient descent.

use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use crate::linalg::{l2_norm, with_bias_column};
use crate::ridge::LinearFit;

/// Logits are clipped to this magnitude before exponentiation.
const LOGIT_CLIP: f64 = 500.0;

pub fn sigmoid(x: f64) -> f64 {
    let z = x.clamp(-LOGIT_CLIP, LOGIT_CLIP);
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone, Copy)]
pub struct GradientDescent {
    pub learning_rate: f64,
    pub max_iterations: usize,
    /// Stop once the gradient's L2 norm falls below this.
    pub tolerance: f64,
}

/// Per-column mean and standard deviation; constant columns get a scale of 1.
fn column_scales(x: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let n = x.nrows().max(1) as f64;
    let means = x.sum_axis(Axis(0)) / n;
    let mut stds = Array1::<f64>::ones(x.ncols());
    for (j, column) in x.axis_iter(Axis(1)).enumerate() {
        let var = column.iter().map(|v| (v - means[j]).powi(2)).sum::<f64>() / n;
        if var.sqrt() > 1e-12 {
            stds[j] = var.sqrt();
        }
    }
    (means, stds)
}

/// Fit weights and intercept for labels in {0, 1}, starting from zero.
///
/// Descent runs on standardized columns; the result is mapped back so it
/// applies to raw feature values.
pub fn fit_logistic(x: &Array2<f64>, y: &Array1<f64>, gd: GradientDescent) -> LinearFit {
    let n = x.nrows().max(1) as f64;
    let d = x.ncols();
    let (means, stds) = column_scales(x);
    let xb = with_bias_column(&((x - &means) / &stds));
    let mut theta = Array1::<f64>::zeros(d + 1);

    let mut iterations = 0;
    for _ in 0..gd.max_iterations {
        let predictions = xb.dot(&theta).mapv(sigmoid);
        let gradient = xb.t().dot(&(predictions - y)) / n;
        if l2_norm(&gradient) < gd.tolerance {
            break;
        }
        theta.scaled_add(-gd.learning_rate, &gradient);
        iterations += 1;
    }
    debug!(iterations, features = d, "logistic regression fitted");

    let weights = &theta.slice(ndarray::s![1..]) / &stds;
    let intercept = theta[0] - weights.dot(&means);
    LinearFit {
        coefficients: weights.to_vec(),
        intercept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn separable(rng: &mut StdRng, n: usize) -> (Array2<f64>, Array1<f64>) {
        let mut x = Array2::<f64>::zeros((n, 2));
        let mut y = Array1::<f64>::zeros(n);
        for i in 0..n {
            let a = rng.gen_range(-2.0..2.0);
            let b = rng.gen_range(-2.0..2.0);
            x[[i, 0]] = a;
            x[[i, 1]] = b;
            y[i] = if 2.0 * a - b + 0.5 > 0.0 { 1.0 } else { 0.0 };
        }
        (x, y)
    }

    fn default_gd() -> GradientDescent {
        GradientDescent {
            learning_rate: 0.1,
            max_iterations: 1000,
            tolerance: 1e-4,
        }
    }

    #[test]
    fn test_sigmoid_is_clipped() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(1e6).is_finite());
        assert!(sigmoid(-1e6) >= 0.0);
        assert!(sigmoid(-1e6) < 1e-200);
        assert!((sigmoid(1e6) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_held_out_accuracy_on_separable_data() {
        let mut rng = StdRng::seed_from_u64(17);
        let (x_train, y_train) = separable(&mut rng, 400);
        let (x_test, y_test) = separable(&mut rng, 200);

        let fit = fit_logistic(&x_train, &y_train, default_gd());
        let correct = (0..x_test.nrows())
            .filter(|&i| {
                let z = fit.coefficients[0] * x_test[[i, 0]]
                    + fit.coefficients[1] * x_test[[i, 1]]
                    + fit.intercept;
                let predicted = if sigmoid(z) >= 0.5 { 1.0 } else { 0.0 };
                predicted == y_test[i]
            })
            .count();
        assert!(correct >= 190, "accuracy {correct}/200");
        assert!(fit.coefficients[0] > 0.0);
        assert!(fit.coefficients[1] < 0.0);
    }

    #[test]
    fn test_zero_iterations_keeps_zero_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        let (x, y) = separable(&mut rng, 20);
        let gd = GradientDescent {
            max_iterations: 0,
            ..default_gd()
        };
        let fit = fit_logistic(&x, &y, gd);
        assert!(fit.coefficients.iter().all(|c| *c == 0.0));
        assert_eq!(fit.intercept, 0.0);
    }
}
