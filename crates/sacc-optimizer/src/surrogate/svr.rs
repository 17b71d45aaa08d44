//! Least-squares support-vector regression.

use nalgebra::{DMatrix, DVector};
use sacc_types::SurrogateError;

use super::linalg;
use super::{check_point, check_samples, Surrogate};

/// LS-SVR with a Gaussian kernel.
///
/// Replaces the epsilon-insensitive loss with a squared loss, so training is a
/// single linear system:
///
/// ```text
/// [ 0   1^T           ] [b]     [0]
/// [ 1   K + I / gamma ] [alpha] [y]
/// ```
#[derive(Debug, Clone)]
pub struct LeastSquaresSvr {
    dimension: usize,
    gamma: f64,
    support: Vec<Vec<f64>>,
    alpha: DVector<f64>,
    bias: f64,
    width: f64,
    y_mean: f64,
    y_std: f64,
    ready: bool,
}

impl LeastSquaresSvr {
    pub fn new(dimension: usize) -> Self {
        Self::with_regularization(dimension, 1e3)
    }

    /// `gamma` trades smoothness (small) for fidelity to the samples (large).
    pub fn with_regularization(dimension: usize, gamma: f64) -> Self {
        Self {
            dimension,
            gamma,
            support: Vec::new(),
            alpha: DVector::zeros(0),
            bias: 0.0,
            width: 1.0,
            y_mean: 0.0,
            y_std: 1.0,
            ready: false,
        }
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        (-linalg::squared_distance(a, b) / (2.0 * self.width * self.width)).exp()
    }
}

impl Surrogate for LeastSquaresSvr {
    fn fit(&mut self, points: &[Vec<f64>], values: &[f64]) -> Result<(), SurrogateError> {
        self.ready = false;
        check_samples(points, values, self.dimension, self.min_samples())?;

        self.width = linalg::mean_pairwise_distance(points).unwrap_or(1.0);
        let (mean, std) = linalg::mean_std(values);
        self.y_mean = mean;
        self.y_std = std;

        let m = points.len();
        let a = DMatrix::from_fn(m + 1, m + 1, |i, j| match (i, j) {
            (0, 0) => 0.0,
            (0, _) | (_, 0) => 1.0,
            _ => {
                let ridge = if i == j { 1.0 / self.gamma } else { 0.0 };
                self.kernel(&points[i - 1], &points[j - 1]) + ridge
            }
        });
        let rhs = DVector::from_fn(m + 1, |i, _| {
            if i == 0 {
                0.0
            } else {
                (values[i - 1] - mean) / std
            }
        });

        let solution = linalg::solve(a, &rhs)?;
        self.bias = solution[0];
        self.alpha = solution.rows(1, m).into_owned();
        self.support = points.to_vec();
        self.ready = true;
        Ok(())
    }

    fn predict(&self, point: &[f64]) -> Result<f64, SurrogateError> {
        if !self.ready {
            return Err(SurrogateError::NotFitted);
        }
        check_point(point, self.dimension)?;
        let standardized: f64 = self.bias
            + self
                .support
                .iter()
                .zip(self.alpha.iter())
                .map(|(s, a)| a * self.kernel(s, point))
                .sum::<f64>();
        Ok(self.y_mean + self.y_std * standardized)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn reset(&mut self) {
        self.ready = false;
        self.support.clear();
        self.alpha = DVector::zeros(0);
    }

    fn min_samples(&self) -> usize {
        self.dimension + 1
    }

    fn name(&self) -> &str {
        "ls_svr"
    }
}
