//! Dense linear algebra helpers over `ndarray`.

use ndarray::{Array1, Array2};
use pulse_core::{KernelError, KernelResult};

/// Pivots smaller than this in magnitude mark the matrix as singular.
pub const PIVOT_EPSILON: f64 = 1e-10;

/// Invert a square matrix by Gauss-Jordan elimination with partial pivoting.
pub fn invert(matrix: &Array2<f64>) -> KernelResult<Array2<f64>> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(KernelError::FeatureLengthMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut a = matrix.clone();
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        let mut pivot_row = col;
        for row in (col + 1)..n {
            if a[[row, col]].abs() > a[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }

        let pivot = a[[pivot_row, col]];
        if !pivot.is_finite() || pivot.abs() < PIVOT_EPSILON {
            return Err(KernelError::SingularMatrix { column: col, pivot });
        }

        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
                inv.swap([col, k], [pivot_row, k]);
            }
        }

        for k in 0..n {
            a[[col, k]] /= pivot;
            inv[[col, k]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                a[[row, k]] -= factor * a[[col, k]];
                inv[[row, k]] -= factor * inv[[col, k]];
            }
        }
    }

    Ok(inv)
}

/// Stack feature rows into an `n x d` matrix, checking every row has `d` columns.
pub fn design_matrix(rows: &[&[f64]], width: usize) -> KernelResult<Array2<f64>> {
    let mut x = Array2::<f64>::zeros((rows.len(), width));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(KernelError::FeatureLengthMismatch {
                expected: width,
                actual: row.len(),
            });
        }
        for (j, value) in row.iter().enumerate() {
            x[[i, j]] = if value.is_finite() { *value } else { 0.0 };
        }
    }
    Ok(x)
}

/// Prepend a column of ones so `theta[0]` is the intercept.
pub fn with_bias_column(x: &Array2<f64>) -> Array2<f64> {
    let (n, d) = x.dim();
    let mut out = Array2::<f64>::ones((n, d + 1));
    out.slice_mut(ndarray::s![.., 1..]).assign(x);
    out
}

pub fn l2_norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}
