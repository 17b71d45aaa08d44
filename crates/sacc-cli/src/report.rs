//! Persisted run output: the convergence table and per-run summaries.

use csv::WriterBuilder;
use sacc_types::{align_traces, ConvergencePoint, RunSummary, SaccError, SaccResult, SurrogateKind};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Field delimiter of the convergence table.
pub const DELIMITER: u8 = b';';

/// `convplot_f{function}_dec{subdim}_popsize{popsize}_{TAG}.csv`
pub fn convergence_file_name(
    function: usize,
    subdim: usize,
    popsize: usize,
    surrogate: SurrogateKind,
) -> String {
    format!(
        "convplot_f{function}_dec{subdim}_popsize{popsize}_{}.csv",
        surrogate.tag()
    )
}

/// Same stem as the convergence table, for the JSON run summaries.
pub fn summary_file_name(
    function: usize,
    subdim: usize,
    popsize: usize,
    surrogate: SurrogateKind,
) -> String {
    format!(
        "summary_f{function}_dec{subdim}_popsize{popsize}_{}.json",
        surrogate.tag()
    )
}

/// Write one row per recorded cycle with an `nfe;error` column pair per
/// repetition. Repetitions with shorter traces leave their cells empty.
pub fn write_convergence_table(path: &Path, traces: &[Vec<ConvergencePoint>]) -> SaccResult<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_path(path)
        .map_err(|e| SaccError::Output(format!("{}: {e}", path.display())))?;

    for row in align_traces(traces) {
        let mut record = Vec::with_capacity(row.len() * 2);
        for cell in row {
            match cell {
                Some(point) => {
                    record.push(point.nfe.to_string());
                    record.push(point.error.to_string());
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        writer
            .write_record(&record)
            .map_err(|e| SaccError::Output(e.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}

/// Pretty-printed JSON array of run summaries, in repetition order.
pub fn write_summaries(path: &Path, summaries: &[RunSummary]) -> SaccResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), summaries)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn file_name_carries_configuration_and_tag() {
        assert_eq!(
            convergence_file_name(3, 5, 10, SurrogateKind::None),
            "convplot_f3_dec5_popsize10_CCJADE.csv"
        );
        assert_eq!(
            convergence_file_name(1, 20, 50, SurrogateKind::GaussianProcess),
            "convplot_f1_dec20_popsize50_GP_SACCJADE.csv"
        );
        assert_eq!(
            summary_file_name(2, 5, 10, SurrogateKind::Svr),
            "summary_f2_dec5_popsize10_SVR_SACCJADE.json"
        );
    }

    #[test]
    fn table_pads_shorter_repetitions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let a = vec![
            ConvergencePoint::new(10, 5.0, 0.0),
            ConvergencePoint::new(20, 3.0, 0.0),
        ];
        let b = vec![ConvergencePoint::new(11, 4.5, 0.0)];

        write_convergence_table(&path, &[a, b]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["10;5;11;4.5", "20;3;;"]);
    }

    #[test]
    fn empty_traces_write_an_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_convergence_table(&path, &[]).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn unwritable_path_is_an_output_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("table.csv");
        let result = write_convergence_table(&path, &[]);
        assert!(matches!(result, Err(SaccError::Output(_))));
    }

    #[test]
    fn summaries_round_trip_through_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let now = Utc::now();
        let summary = RunSummary {
            best_fitness: 1.5,
            best_error: 1.5,
            best_position: vec![0.5, -0.5],
            evaluations: 1_000,
            cycles: 7,
            elapsed_seconds: 0.25,
            started_at: now,
            finished_at: now,
        };

        write_summaries(&path, std::slice::from_ref(&summary)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Vec<RunSummary> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vec![summary]);
    }
}
