//! Convergence records and run summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point on a convergence curve, recorded once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    /// True evaluations consumed so far.
    pub nfe: usize,
    /// |best fitness - known optimum|.
    pub error: f64,
    /// Mean absolute surrogate prediction error over the cycle (0 when unused).
    pub surrogate_error: f64,
}

impl ConvergencePoint {
    pub fn new(nfe: usize, error: f64, surrogate_error: f64) -> Self {
        Self {
            nfe,
            error,
            surrogate_error,
        }
    }
}

/// Outcome of a complete optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub best_fitness: f64,
    pub best_error: f64,
    pub best_position: Vec<f64>,
    pub evaluations: usize,
    pub cycles: usize,
    pub elapsed_seconds: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Pad a set of traces to a common length, row-major.
///
/// Row `q` holds the `q`-th point of every trace, or `None` where a trace is
/// shorter.
pub fn align_traces(traces: &[Vec<ConvergencePoint>]) -> Vec<Vec<Option<ConvergencePoint>>> {
    let rows = traces.iter().map(Vec::len).max().unwrap_or(0);
    (0..rows)
        .map(|q| traces.iter().map(|t| t.get(q).copied()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_pads_short_traces() {
        let a = vec![
            ConvergencePoint::new(10, 5.0, 0.0),
            ConvergencePoint::new(20, 3.0, 0.0),
        ];
        let b = vec![ConvergencePoint::new(11, 4.0, 0.0)];
        let rows = align_traces(&[a, b]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1].unwrap().nfe, 11);
        assert!(rows[1][1].is_none());
        assert_eq!(rows[1][0].unwrap().error, 3.0);
    }

    #[test]
    fn align_empty() {
        assert!(align_traces(&[]).is_empty());
        assert!(align_traces(&[Vec::new()]).is_empty());
    }

    #[test]
    fn summary_round_trip() {
        let now = Utc::now();
        let summary = RunSummary {
            best_fitness: 1.5,
            best_error: 1.5,
            best_position: vec![0.1, 0.2],
            evaluations: 100,
            cycles: 4,
            elapsed_seconds: 0.25,
            started_at: now,
            finished_at: now,
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, back);
    }
}
