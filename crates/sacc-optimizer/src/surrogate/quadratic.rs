//! Quadratic polynomial local approximation.

use nalgebra::{DMatrix, DVector};
use sacc_types::SurrogateError;

use super::linalg;
use super::{check_point, check_samples, Surrogate};

/// Ridge added to the normal equations to keep them solvable on degenerate
/// sample sets.
const RIDGE: f64 = 1e-10;

/// Full quadratic model `c0 + sum(ci xi) + sum(cij xi xj), i <= j` fitted by
/// least squares.
///
/// Inputs are centred and scaled before fitting so the normal equations stay
/// well conditioned for wide bounds.
#[derive(Debug, Clone)]
pub struct QuadraticRegression {
    dimension: usize,
    coefficients: DVector<f64>,
    center: Vec<f64>,
    scale: f64,
    ready: bool,
}

impl QuadraticRegression {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            coefficients: DVector::zeros(0),
            center: vec![0.0; dimension],
            scale: 1.0,
            ready: false,
        }
    }

    /// Number of free coefficients: `(n + 1)(n + 2) / 2`.
    pub fn term_count(dimension: usize) -> usize {
        (dimension + 1) * (dimension + 2) / 2
    }

    fn features(&self, point: &[f64]) -> DVector<f64> {
        let z: Vec<f64> = point
            .iter()
            .zip(&self.center)
            .map(|(x, c)| (x - c) / self.scale)
            .collect();

        let mut phi = Vec::with_capacity(Self::term_count(self.dimension));
        phi.push(1.0);
        phi.extend_from_slice(&z);
        for i in 0..z.len() {
            for j in i..z.len() {
                phi.push(z[i] * z[j]);
            }
        }
        DVector::from_vec(phi)
    }
}

impl Surrogate for QuadraticRegression {
    fn fit(&mut self, points: &[Vec<f64>], values: &[f64]) -> Result<(), SurrogateError> {
        self.ready = false;
        check_samples(points, values, self.dimension, self.min_samples())?;

        let m = points.len() as f64;
        self.center = (0..self.dimension)
            .map(|d| points.iter().map(|p| p[d]).sum::<f64>() / m)
            .collect();
        self.scale = points
            .iter()
            .flat_map(|p| p.iter().zip(&self.center).map(|(x, c)| (x - c).abs()))
            .fold(0.0_f64, f64::max);
        if self.scale <= 0.0 {
            self.scale = 1.0;
        }

        // Least squares through the ridge-regularized normal equations.
        let terms = Self::term_count(self.dimension);
        let rows: Vec<DVector<f64>> = points.iter().map(|p| self.features(p)).collect();
        let design = DMatrix::from_fn(points.len(), terms, |r, c| rows[r][c]);
        let normal = design.tr_mul(&design) + DMatrix::identity(terms, terms) * RIDGE;
        let rhs = design.tr_mul(&DVector::from_column_slice(values));

        self.coefficients = linalg::solve_spd(normal, &rhs)?;
        self.ready = true;
        Ok(())
    }

    fn predict(&self, point: &[f64]) -> Result<f64, SurrogateError> {
        if !self.ready {
            return Err(SurrogateError::NotFitted);
        }
        check_point(point, self.dimension)?;
        Ok(self.features(point).dot(&self.coefficients))
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn reset(&mut self) {
        self.ready = false;
    }

    fn min_samples(&self) -> usize {
        Self::term_count(self.dimension)
    }

    fn name(&self) -> &str {
        "quadratic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_count_matches_full_quadratic() {
        assert_eq!(QuadraticRegression::term_count(1), 3);
        assert_eq!(QuadraticRegression::term_count(2), 6);
        assert_eq!(QuadraticRegression::term_count(5), 21);
    }

    #[test]
    fn recovers_exact_quadratic_with_cross_term() {
        let f = |x: &[f64]| 3.0 + 2.0 * x[0] - x[1] + 0.5 * x[0] * x[1] + 4.0 * x[1] * x[1];
        let mut points = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                points.push(vec![i as f64 * 10.0 - 15.0, j as f64 * 7.0 - 10.0]);
            }
        }
        let values: Vec<f64> = points.iter().map(|p| f(p)).collect();

        let mut model = QuadraticRegression::new(2);
        model.fit(&points, &values).unwrap();

        for probe in [[1.0, 2.0], [-30.0, 12.5], [0.0, 0.0]] {
            let got = model.predict(&probe).unwrap();
            assert!((got - f(&probe)).abs() < 1e-5, "{probe:?}: {got}");
        }
    }

    #[test]
    fn needs_one_sample_per_coefficient() {
        let mut model = QuadraticRegression::new(5);
        let points = vec![vec![0.0; 5]; 20];
        let values = vec![0.0; 20];
        assert_eq!(
            model.fit(&points, &values),
            Err(SurrogateError::InsufficientData {
                required: 21,
                available: 20
            })
        );
    }

    #[test]
    fn predict_checks_dimension() {
        let mut model = QuadraticRegression::new(1);
        model.fit(&[vec![0.0], vec![1.0], vec![2.0]], &[0.0, 1.0, 4.0]).unwrap();
        assert!(matches!(
            model.predict(&[0.0, 1.0]),
            Err(SurrogateError::DimensionMismatch { .. })
        ));
        assert!((model.predict(&[3.0]).unwrap() - 9.0).abs() < 1e-6);
    }
}
