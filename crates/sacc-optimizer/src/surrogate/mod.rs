//! Surrogate models: cheap approximations of the objective fitted on a window
//! of truly evaluated samples.
//!
//! Every variant answers the same three questions: can it be fitted from the
//! samples at hand ([`Surrogate::fit`]), what does it predict
//! ([`Surrogate::predict`]), and is it currently usable
//! ([`Surrogate::is_ready`]). The variant is picked once, from a
//! [`SurrogateKind`], when an optimizer is built.

mod gp;
pub(crate) mod linalg;
mod quadratic;
mod rbf;
mod svr;

pub use gp::GaussianProcess;
pub use quadratic::QuadraticRegression;
pub use rbf::RbfNetwork;
pub use svr::LeastSquaresSvr;

use sacc_types::{SurrogateError, SurrogateKind};

/// Common trait for all surrogate models.
pub trait Surrogate: Send + std::fmt::Debug {
    /// Refit the model on the given samples, replacing any previous fit.
    ///
    /// On error the model is left unfitted.
    fn fit(&mut self, points: &[Vec<f64>], values: &[f64]) -> Result<(), SurrogateError>;

    /// Predict the objective at `point`. Fails on an unfitted model.
    fn predict(&self, point: &[f64]) -> Result<f64, SurrogateError>;

    /// Whether the last fit succeeded.
    fn is_ready(&self) -> bool;

    /// Drop the current fit.
    fn reset(&mut self);

    /// Fewest samples a fit needs.
    fn min_samples(&self) -> usize;

    /// Human-readable model name.
    fn name(&self) -> &str;
}

/// Build the surrogate selected by `kind` for points of `dimension` coordinates.
pub fn build_surrogate(kind: SurrogateKind, dimension: usize) -> Box<dyn Surrogate> {
    match kind {
        SurrogateKind::None => Box::new(NoSurrogate),
        SurrogateKind::GaussianProcess => Box::new(GaussianProcess::new(dimension)),
        SurrogateKind::Quadratic => Box::new(QuadraticRegression::new(dimension)),
        SurrogateKind::Rbfn => Box::new(RbfNetwork::new(dimension)),
        SurrogateKind::Svr => Box::new(LeastSquaresSvr::new(dimension)),
    }
}

/// The absent model. It never has enough data, so every evaluation is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSurrogate;

impl Surrogate for NoSurrogate {
    fn fit(&mut self, _points: &[Vec<f64>], values: &[f64]) -> Result<(), SurrogateError> {
        Err(SurrogateError::InsufficientData {
            required: usize::MAX,
            available: values.len(),
        })
    }

    fn predict(&self, _point: &[f64]) -> Result<f64, SurrogateError> {
        Err(SurrogateError::NotFitted)
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn reset(&mut self) {}

    fn min_samples(&self) -> usize {
        usize::MAX
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Validate a sample set before fitting.
pub(crate) fn check_samples(
    points: &[Vec<f64>],
    values: &[f64],
    dimension: usize,
    required: usize,
) -> Result<(), SurrogateError> {
    if points.len() != values.len() {
        return Err(SurrogateError::DimensionMismatch {
            expected: points.len(),
            actual: values.len(),
        });
    }
    if let Some(bad) = points.iter().find(|p| p.len() != dimension) {
        return Err(SurrogateError::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }
    if points.len() < required {
        return Err(SurrogateError::InsufficientData {
            required,
            available: points.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_point(point: &[f64], dimension: usize) -> Result<(), SurrogateError> {
    if point.len() != dimension {
        return Err(SurrogateError::DimensionMismatch {
            expected: dimension,
            actual: point.len(),
        });
    }
    Ok(())
}

/// Bounded window of the most recent truly evaluated samples.
///
/// Once full, each new sample overwrites the oldest one in place.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    points: Vec<Vec<f64>>,
    values: Vec<f64>,
    capacity: usize,
    next: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    pub fn push(&mut self, point: &[f64], value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() < self.capacity {
            self.points.push(point.to_vec());
            self.values.push(value);
        } else {
            self.points[self.next].copy_from_slice(point);
            self.values[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.values.clear();
        self.next = 0;
    }
}
