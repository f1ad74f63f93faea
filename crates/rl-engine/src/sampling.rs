//! Gamma and Beta sampling for Thompson Sampling.

use rand::Rng;

use crate::arm::MIN_SHAPE;

/// Sample from Gamma(shape, 1).
///
/// For shape >= 1 this uses the Marsaglia-Tsang method.
/// For shape < 1 it uses the boost `Gamma(a) = Gamma(a + 1) * U^(1/a)`.
pub fn gamma_sample<R: Rng>(rng: &mut R, shape: f64) -> f64 {
    let shape = if shape.is_finite() {
        shape.max(MIN_SHAPE)
    } else {
        MIN_SHAPE
    };

    if shape < 1.0 {
        let u: f64 = rng.gen();
        return gamma_sample(rng, shape + 1.0) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    loop {
        let z = standard_normal(rng);
        let cube_root = 1.0 + c * z;
        if cube_root <= 0.0 {
            continue;
        }
        let v = cube_root * cube_root * cube_root;
        let u: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
        if accept_candidate(u, z, v, d) {
            return d * v;
        }
    }
}

/// Standard normal draw via the Marsaglia polar method.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    loop {
        let x: f64 = rng.gen_range(-1.0..1.0);
        let y: f64 = rng.gen_range(-1.0..1.0);
        let r2 = x * x + y * y;
        if r2 > 0.0 && r2 < 1.0 {
            return x * (-2.0 * r2.ln() / r2).sqrt();
        }
    }
}

/// Accept `d * v` when `u` falls under the target density ratio.
/// The polynomial squeeze settles most draws without a logarithm.
fn accept_candidate(u: f64, z: f64, v: f64, d: f64) -> bool {
    let z2 = z * z;
    if u < 1.0 - 0.0331 * z2 * z2 {
        return true;
    }
    u.ln() < 0.5 * z2 + d * (1.0 - v + v.ln())
}

/// Sample from Beta(alpha, beta) as `X / (X + Y)` with
/// `X ~ Gamma(alpha)`, `Y ~ Gamma(beta)`.
pub fn beta_sample<R: Rng>(rng: &mut R, alpha: f64, beta: f64) -> f64 {
    let x = gamma_sample(rng, alpha);
    let y = gamma_sample(rng, beta);
    if x + y > 0.0 {
        x / (x + y)
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn mean_and_variance(samples: &[f64]) -> (f64, f64) {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (mean, var)
    }

    #[test]
    fn test_gamma_moments() {
        let mut rng = StdRng::seed_from_u64(7);
        for shape in [0.3, 1.0, 2.5, 40.0] {
            let samples: Vec<f64> = (0..20_000).map(|_| gamma_sample(&mut rng, shape)).collect();
            let (mean, var) = mean_and_variance(&samples);
            assert!((mean - shape).abs() < 0.05 * shape + 0.02, "shape {shape}: mean {mean}");
            assert!((var - shape).abs() < 0.1 * shape + 0.03, "shape {shape}: var {var}");
            assert!(samples.iter().all(|x| *x >= 0.0 && x.is_finite()));
        }
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(5);
        let samples: Vec<f64> = (0..20_000).map(|_| standard_normal(&mut rng)).collect();
        let (mean, var) = mean_and_variance(&samples);
        assert!(mean.abs() < 0.03, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "var {var}");
    }

    #[test]
    fn test_squeeze_accepts_near_mode() {
        // z = 0 gives v = 1, which the squeeze accepts for any u < 1.
        assert!(accept_candidate(0.99, 0.0, 1.0, 2.0));
        // Far in the tail the density ratio is tiny.
        let z: f64 = 4.0;
        let d: f64 = 2.0 - 1.0 / 3.0;
        let v = (1.0 + z / (9.0 * d).sqrt()).powi(3);
        assert!(!accept_candidate(0.5, z, v, d));
    }

    #[test]
    fn test_beta_mean() {
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<f64> = (0..20_000).map(|_| beta_sample(&mut rng, 8.0, 2.0)).collect();
        let (mean, _) = mean_and_variance(&samples);
        assert!((mean - 0.8).abs() < 0.01, "mean {mean}");
        assert!(samples.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn test_degenerate_shapes_stay_finite() {
        let mut rng = StdRng::seed_from_u64(3);
        for (a, b) in [(0.0, 1.0), (-2.0, -2.0), (f64::NAN, 1.0), (1e-6, 1e-6)] {
            let s = beta_sample(&mut rng, a, b);
            assert!(s.is_finite());
            assert!((0.0..=1.0).contains(&s));
        }
    }
}
