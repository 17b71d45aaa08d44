//! Benchmark catalogue used by the command line.
//!
//! Classic large-scale test functions with their optimum (0) at the origin.
//! They stand in for the CEC'2013 LSGO suite, which is not bundled.

use sacc_types::{config_error, Fitness, SaccResult};

/// Selector range accepted by [`Benchmark::from_index`].
pub const BENCHMARK_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkKind {
    Sphere,
    Elliptic,
    Rastrigin,
    Ackley,
    Schwefel12,
    Rosenbrock,
}

#[derive(Debug, Clone)]
pub struct Benchmark {
    kind: BenchmarkKind,
    dimension: usize,
}

impl Benchmark {
    pub fn new(kind: BenchmarkKind, dimension: usize) -> Self {
        Self { kind, dimension }
    }

    /// Benchmark by its 1-based command-line index.
    pub fn from_index(index: usize, dimension: usize) -> SaccResult<Self> {
        let kind = match index {
            1 => BenchmarkKind::Sphere,
            2 => BenchmarkKind::Elliptic,
            3 => BenchmarkKind::Rastrigin,
            4 => BenchmarkKind::Ackley,
            5 => BenchmarkKind::Schwefel12,
            6 => BenchmarkKind::Rosenbrock,
            _ => {
                return Err(config_error!(
                    "function index out of allowed bounds [1..{BENCHMARK_COUNT}]: {index}"
                ))
            }
        };
        Ok(Self::new(kind, dimension))
    }
}

impl Fitness for Benchmark {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn lower_bound(&self) -> f64 {
        match self.kind {
            BenchmarkKind::Rastrigin => -5.0,
            BenchmarkKind::Ackley => -32.0,
            _ => -100.0,
        }
    }

    fn upper_bound(&self) -> f64 {
        -self.lower_bound()
    }

    fn evaluate(&self, x: &[f64]) -> f64 {
        match self.kind {
            BenchmarkKind::Sphere => x.iter().map(|v| v * v).sum(),
            BenchmarkKind::Elliptic => {
                let n = (x.len().max(2) - 1) as f64;
                x.iter()
                    .enumerate()
                    .map(|(i, v)| 1e6_f64.powf(i as f64 / n) * v * v)
                    .sum()
            }
            BenchmarkKind::Rastrigin => x
                .iter()
                .map(|v| v * v - 10.0 * (2.0 * std::f64::consts::PI * v).cos() + 10.0)
                .sum(),
            BenchmarkKind::Ackley => {
                let n = x.len() as f64;
                let sq = x.iter().map(|v| v * v).sum::<f64>() / n;
                let cos = x
                    .iter()
                    .map(|v| (2.0 * std::f64::consts::PI * v).cos())
                    .sum::<f64>()
                    / n;
                -20.0 * (-0.2 * sq.sqrt()).exp() - cos.exp() + 20.0 + std::f64::consts::E
            }
            BenchmarkKind::Schwefel12 => {
                let mut prefix = 0.0;
                x.iter()
                    .map(|v| {
                        prefix += v;
                        prefix * prefix
                    })
                    .sum()
            }
            // Shifted by one so the optimum sits at the origin.
            BenchmarkKind::Rosenbrock => x
                .windows(2)
                .map(|w| {
                    let (a, b) = (w[0] + 1.0, w[1] + 1.0);
                    100.0 * (a * a - b).powi(2) + (a - 1.0).powi(2)
                })
                .sum(),
        }
    }

    fn name(&self) -> &str {
        match self.kind {
            BenchmarkKind::Sphere => "sphere",
            BenchmarkKind::Elliptic => "elliptic",
            BenchmarkKind::Rastrigin => "rastrigin",
            BenchmarkKind::Ackley => "ackley",
            BenchmarkKind::Schwefel12 => "schwefel_1_2",
            BenchmarkKind::Rosenbrock => "rosenbrock",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimum_is_zero_at_origin() {
        for index in 1..=BENCHMARK_COUNT {
            let f = Benchmark::from_index(index, 10).unwrap();
            let value = f.evaluate(&[0.0; 10]);
            assert!(value.abs() < 1e-12, "{}: {value}", f.name());
            assert_eq!(f.optimum(), 0.0);
        }
    }

    #[test]
    fn positive_away_from_origin() {
        for index in 1..=BENCHMARK_COUNT {
            let f = Benchmark::from_index(index, 4).unwrap();
            assert!(f.evaluate(&[0.7, -1.3, 2.0, 0.1]) > 0.0, "{}", f.name());
        }
    }

    #[test]
    fn index_out_of_range() {
        assert!(matches!(
            Benchmark::from_index(0, 10),
            Err(sacc_types::SaccError::Config(_))
        ));
        assert!(Benchmark::from_index(BENCHMARK_COUNT + 1, 10).is_err());
    }

    #[test]
    fn bounds_are_symmetric() {
        let f = Benchmark::new(BenchmarkKind::Ackley, 3);
        assert_eq!(f.lower_bound(), -32.0);
        assert_eq!(f.upper_bound(), 32.0);
    }
}
