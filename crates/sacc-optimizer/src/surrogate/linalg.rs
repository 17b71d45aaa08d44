//! Dense linear solves and sample statistics shared by the surrogate models.

use nalgebra::{DMatrix, DVector};
use sacc_types::SurrogateError;

/// Pivots smaller than this, relative to the largest entry, count as zero.
const PIVOT_EPS: f64 = 1e-12;

fn check_system(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<(), SurrogateError> {
    if !a.is_square() || a.nrows() != b.len() {
        return Err(SurrogateError::DimensionMismatch {
            expected: b.len(),
            actual: a.nrows(),
        });
    }
    Ok(())
}

/// Solve `a * x = b` through an LU decomposition with partial pivoting.
pub fn solve(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, SurrogateError> {
    check_system(&a, b)?;
    let n = b.len();
    if n == 0 {
        return Ok(DVector::zeros(0));
    }

    let scale = a.amax().max(1.0);
    let lu = a.lu();
    let smallest = lu.u().diagonal().amin();
    if smallest <= PIVOT_EPS * scale {
        return Err(SurrogateError::Singular {
            message: format!("pivot {smallest:e} in {n}x{n} system"),
        });
    }

    lu.solve(b)
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .ok_or_else(|| SurrogateError::Singular {
            message: format!("no finite solution for {n}x{n} system"),
        })
}

/// Solve `a * x = b` for a symmetric positive-definite `a` via Cholesky.
pub fn solve_spd(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, SurrogateError> {
    check_system(&a, b)?;
    let n = b.len();
    let factor = a.cholesky().ok_or_else(|| SurrogateError::Singular {
        message: format!("{n}x{n} matrix is not positive definite"),
    })?;
    Ok(factor.solve(b))
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Mean Euclidean distance over all sample pairs, or `None` when every
/// sample coincides.
pub fn mean_pairwise_distance(points: &[Vec<f64>]) -> Option<f64> {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            total += squared_distance(a, b).sqrt();
            pairs += 1;
        }
    }
    let mean = total / pairs.max(1) as f64;
    (mean > 0.0 && mean.is_finite()).then_some(mean)
}

/// Mean and standard deviation of `values` (population form, std floored at 1e-12).
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt().max(1e-12))
}
