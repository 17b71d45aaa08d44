//! # sacc-optimizer
//!
//! Surrogate-assisted cooperative coevolution for large-scale, expensive
//! continuous optimization.
//!
//! Provides the coordinate decomposition, the per-subcomponent JADE optimizer
//! with its archive and surrogate gate, the surrogate model family, and the
//! budget-driven coevolution cycle that ties them together.

mod archive;
mod assignment;
mod ccde;
mod decomposer;
mod jade;
pub mod surrogate;

pub use archive::Archive;
pub use assignment::CoordinateAssignment;
pub use ccde::Ccde;
pub use decomposer::{Decomposer, DecomposerSettings};
pub use jade::{reflect_into_bounds, Jade, SurrogateStats};
pub use surrogate::{build_surrogate, SampleWindow, Surrogate};
