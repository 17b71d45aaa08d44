pub mod config;
pub mod convergence;
pub mod errors;
pub mod fitness;

pub use config::*;
pub use convergence::*;
pub use errors::*;
pub use fitness::*;
