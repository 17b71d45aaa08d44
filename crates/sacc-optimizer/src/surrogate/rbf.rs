//! Radial-basis-function network with a cubic kernel and a linear tail.

use nalgebra::{DMatrix, DVector};
use sacc_types::SurrogateError;

use super::linalg;
use super::{check_point, check_samples, Surrogate};

const RIDGE: f64 = 1e-9;

/// Interpolating RBF network `s(x) = sum(wi |x - ci|^3) + b0 + b^T x`.
///
/// One centre per training sample. The linear tail makes the interpolation
/// system uniquely solvable once the samples are affinely independent, which
/// needs at least `n + 1` of them.
#[derive(Debug, Clone)]
pub struct RbfNetwork {
    dimension: usize,
    centers: Vec<Vec<f64>>,
    weights: DVector<f64>,
    tail: DVector<f64>,
    offset: Vec<f64>,
    scale: f64,
    ready: bool,
}

impl RbfNetwork {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            centers: Vec::new(),
            weights: DVector::zeros(0),
            tail: DVector::zeros(0),
            offset: vec![0.0; dimension],
            scale: 1.0,
            ready: false,
        }
    }

    fn normalize(&self, point: &[f64]) -> Vec<f64> {
        point
            .iter()
            .zip(&self.offset)
            .map(|(x, o)| (x - o) / self.scale)
            .collect()
    }

    fn basis(a: &[f64], b: &[f64]) -> f64 {
        linalg::squared_distance(a, b).sqrt().powi(3)
    }
}

impl Surrogate for RbfNetwork {
    fn fit(&mut self, points: &[Vec<f64>], values: &[f64]) -> Result<(), SurrogateError> {
        self.ready = false;
        check_samples(points, values, self.dimension, self.min_samples())?;

        let m = points.len();
        let n = self.dimension;
        self.offset = (0..n)
            .map(|d| points.iter().map(|p| p[d]).sum::<f64>() / m as f64)
            .collect();
        self.scale = linalg::mean_pairwise_distance(points).unwrap_or(1.0);
        let centers: Vec<Vec<f64>> = points.iter().map(|p| self.normalize(p)).collect();

        // [ Phi  P ] [w]   [y]
        // [ P^T  0 ] [b] = [0]
        let size = m + n + 1;
        let mut a = DMatrix::zeros(size, size);
        for i in 0..m {
            for j in 0..m {
                a[(i, j)] = Self::basis(&centers[i], &centers[j]);
            }
            a[(i, i)] += RIDGE;
            a[(i, m)] = 1.0;
            a[(m, i)] = 1.0;
            for d in 0..n {
                a[(i, m + 1 + d)] = centers[i][d];
                a[(m + 1 + d, i)] = centers[i][d];
            }
        }
        let rhs = DVector::from_fn(size, |i, _| if i < m { values[i] } else { 0.0 });

        let solution = linalg::solve(a, &rhs)?;
        self.weights = solution.rows(0, m).into_owned();
        self.tail = solution.rows(m, n + 1).into_owned();
        self.centers = centers;
        self.ready = true;
        Ok(())
    }

    fn predict(&self, point: &[f64]) -> Result<f64, SurrogateError> {
        if !self.ready {
            return Err(SurrogateError::NotFitted);
        }
        check_point(point, self.dimension)?;
        let z = self.normalize(point);
        let radial: f64 = self
            .centers
            .iter()
            .zip(self.weights.iter())
            .map(|(c, w)| w * Self::basis(c, &z))
            .sum();
        let linear = self.tail[0] + self.tail.rows(1, self.dimension).dot(&DVector::from_vec(z));
        Ok(radial + linear)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn reset(&mut self) {
        self.ready = false;
        self.centers.clear();
        self.weights = DVector::zeros(0);
        self.tail = DVector::zeros(0);
    }

    fn min_samples(&self) -> usize {
        self.dimension + 1
    }

    fn name(&self) -> &str {
        "rbf_network"
    }
}
