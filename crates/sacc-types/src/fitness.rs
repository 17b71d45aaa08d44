//! The fitness collaborator.

use crate::errors::SaccResult;
use crate::validation_error;

/// An expensive objective function to be minimized.
///
/// Implementations must be deterministic: evaluating the same point twice
/// returns the same value. Bounds are uniform across all dimensions.
pub trait Fitness: Sync {
    /// Number of decision variables.
    fn dimension(&self) -> usize;

    /// Lower bound shared by every coordinate.
    fn lower_bound(&self) -> f64;

    /// Upper bound shared by every coordinate.
    fn upper_bound(&self) -> f64;

    /// Evaluate a full-dimension point. `x.len()` equals [`Fitness::dimension`].
    fn evaluate(&self, x: &[f64]) -> f64;

    /// Known optimum value, used to report the error of a run.
    fn optimum(&self) -> f64 {
        0.0
    }

    /// Short human-readable name.
    fn name(&self) -> &str {
        "objective"
    }
}

impl<F: Fitness + ?Sized> Fitness for &F {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn lower_bound(&self) -> f64 {
        (**self).lower_bound()
    }

    fn upper_bound(&self) -> f64 {
        (**self).upper_bound()
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        (**self).evaluate(x)
    }

    fn optimum(&self) -> f64 {
        (**self).optimum()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Check that `fitness` describes a searchable box: finite bounds with
/// `lower < upper`.
pub fn validate_bounds(fitness: &dyn Fitness) -> SaccResult<()> {
    let (lower, upper) = (fitness.lower_bound(), fitness.upper_bound());
    if !lower.is_finite() || !upper.is_finite() {
        return Err(validation_error!(
            "{}: bounds must be finite, got [{lower}, {upper}]",
            fitness.name()
        ));
    }
    if lower >= upper {
        return Err(validation_error!(
            "{}: lower bound {lower} is not below upper bound {upper}",
            fitness.name()
        ));
    }
    Ok(())
}
