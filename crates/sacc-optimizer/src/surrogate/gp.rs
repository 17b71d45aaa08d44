//! Gaussian-process regression with a squared-exponential kernel.

use nalgebra::{DMatrix, DVector};
use sacc_types::SurrogateError;

use super::linalg;
use super::{check_point, check_samples, Surrogate};

/// Diagonal jitter on the standardized kernel matrix.
const NUGGET: f64 = 1e-6;

/// Gaussian process with a constant mean and fixed hyper-parameters.
///
/// The length scale is set to the mean pairwise distance of the training
/// points at every fit; targets are standardized. Only the posterior mean is
/// used for prediction.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    dimension: usize,
    points: Vec<Vec<f64>>,
    alpha: DVector<f64>,
    length_scale: f64,
    y_mean: f64,
    y_std: f64,
    ready: bool,
}

impl GaussianProcess {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: Vec::new(),
            alpha: DVector::zeros(0),
            length_scale: 1.0,
            y_mean: 0.0,
            y_std: 1.0,
            ready: false,
        }
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let d2 = linalg::squared_distance(a, b);
        (-0.5 * d2 / (self.length_scale * self.length_scale)).exp()
    }
}

impl Surrogate for GaussianProcess {
    fn fit(&mut self, points: &[Vec<f64>], values: &[f64]) -> Result<(), SurrogateError> {
        self.ready = false;
        check_samples(points, values, self.dimension, self.min_samples())?;

        self.length_scale = linalg::mean_pairwise_distance(points).unwrap_or(1.0);
        let (mean, std) = linalg::mean_std(values);
        self.y_mean = mean;
        self.y_std = std;

        let n = points.len();
        let k = DMatrix::from_fn(n, n, |i, j| {
            let nugget = if i == j { NUGGET } else { 0.0 };
            self.kernel(&points[i], &points[j]) + nugget
        });
        let targets = DVector::from_iterator(n, values.iter().map(|v| (v - mean) / std));

        self.alpha = linalg::solve_spd(k, &targets)?;
        self.points = points.to_vec();
        self.ready = true;
        Ok(())
    }

    fn predict(&self, point: &[f64]) -> Result<f64, SurrogateError> {
        if !self.ready {
            return Err(SurrogateError::NotFitted);
        }
        check_point(point, self.dimension)?;
        let standardized: f64 = self
            .points
            .iter()
            .zip(self.alpha.iter())
            .map(|(p, a)| a * self.kernel(p, point))
            .sum();
        Ok(self.y_mean + self.y_std * standardized)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn reset(&mut self) {
        self.ready = false;
        self.points.clear();
        self.alpha = DVector::zeros(0);
    }

    fn min_samples(&self) -> usize {
        self.dimension + 1
    }

    fn name(&self) -> &str {
        "gaussian_process"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_training_points() {
        let points: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, (i * i) as f64 * 0.1]).collect();
        let values: Vec<f64> = points.iter().map(|p| p[0].sin() + p[1]).collect();
        let mut gp = GaussianProcess::new(2);
        gp.fit(&points, &values).unwrap();
        for (p, v) in points.iter().zip(&values) {
            assert!((gp.predict(p).unwrap() - v).abs() < 0.05);
        }
    }

    #[test]
    fn duplicate_points_are_rejected_or_smoothed() {
        let points = vec![vec![1.0, 1.0]; 4];
        let values = vec![2.0; 4];
        let mut gp = GaussianProcess::new(2);
        // Identical inputs give a rank-one kernel; the nugget keeps it definite.
        if gp.fit(&points, &values).is_ok() {
            assert!((gp.predict(&[1.0, 1.0]).unwrap() - 2.0).abs() < 1e-6);
        }
    }
}
