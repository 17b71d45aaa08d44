//! `saccjade`: run repeated SACCJADE optimizations on a benchmark function and
//! persist their convergence.

mod functions;
mod logging;
mod report;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use sacc_optimizer::Ccde;
use sacc_types::{CcdeConfig, ConvergencePoint, Fitness, RunSummary, SaccResult, SurrogateKind};
use std::path::PathBuf;
use tracing::info;

use crate::functions::{Benchmark, BENCHMARK_COUNT};

const MAX_REPETITIONS: usize = 100;
const MAX_DIMENSION: usize = 1000;

#[derive(Parser, Debug)]
#[command(
    name = "saccjade",
    version,
    about = "Surrogate-assisted cooperative coevolution with JADE"
)]
struct Cli {
    /// Benchmark function (1 sphere, 2 elliptic, 3 rastrigin, 4 ackley,
    /// 5 schwefel 1.2, 6 rosenbrock)
    #[arg(short = 'f', long, default_value_t = 1)]
    function: usize,

    /// Surrogate model: none, gp, qpa, rbfn or svr
    #[arg(short = 'm', long, default_value = "none")]
    metamodel: SurrogateKind,

    /// Independent repetitions; repetition k runs with seed k
    #[arg(short = 'r', long, default_value_t = 1)]
    repetitions: usize,

    /// JADE generations per optimizer call
    #[arg(short = 'i', long, default_value_t = 5)]
    iterations: usize,

    #[arg(short = 'd', long, default_value_t = 1000)]
    dimension: usize,

    /// Coordinates per subcomponent
    #[arg(short = 's', long, default_value_t = 5)]
    subdim: usize,

    /// Individuals per subcomponent
    #[arg(short = 'p', long, default_value_t = 10)]
    popsize: usize,

    /// Budget of true fitness evaluations per repetition
    #[arg(short = 'e', long, default_value_t = 10_000)]
    fevals: usize,

    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Operator-facing range checks, run before any optimization.
    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=BENCHMARK_COUNT).contains(&self.function),
            "function index out of allowed bounds [1..{BENCHMARK_COUNT}]: {}",
            self.function
        );
        ensure!(
            (1..=MAX_REPETITIONS).contains(&self.repetitions),
            "repetitions out of allowed bounds [1..{MAX_REPETITIONS}]: {}",
            self.repetitions
        );
        ensure!(
            (1..=MAX_DIMENSION).contains(&self.dimension),
            "dimension out of allowed bounds [1..{MAX_DIMENSION}]: {}",
            self.dimension
        );
        self.config().validate(self.dimension)?;
        Ok(())
    }

    fn config(&self) -> CcdeConfig {
        CcdeConfig::new(self.fevals)
            .with_subcomponent_size(self.subdim)
            .with_population(self.popsize)
            .with_generations_per_cycle(self.iterations)
            .with_surrogate(self.metamodel)
    }
}

/// Convergence trace and summary of every repetition, in seed order.
fn run_repetitions(
    config: &CcdeConfig,
    fitness: &Benchmark,
    repetitions: usize,
) -> SaccResult<Vec<(Vec<ConvergencePoint>, RunSummary)>> {
    (0..repetitions)
        .into_par_iter()
        .map(|rep| {
            let mut trace = Vec::new();
            let summary =
                Ccde::new(config.clone().with_seed(rep as u64)).optimize(fitness, &mut trace)?;
            info!(
                repetition = rep,
                best_error = summary.best_error,
                evaluations = summary.evaluations,
                "repetition finished"
            );
            Ok((trace, summary))
        })
        .collect()
}

fn run(cli: &Cli) -> Result<()> {
    cli.validate()?;
    let benchmark = Benchmark::from_index(cli.function, cli.dimension)?;
    let config = cli.config();

    info!(
        function = benchmark.name(),
        dimension = cli.dimension,
        surrogate = %cli.metamodel,
        repetitions = cli.repetitions,
        "starting experiment"
    );

    let results = run_repetitions(&config, &benchmark, cli.repetitions)?;
    let (traces, summaries): (Vec<_>, Vec<_>) = results.into_iter().unzip();

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;
    let table = cli.output_dir.join(report::convergence_file_name(
        cli.function,
        cli.subdim,
        cli.popsize,
        cli.metamodel,
    ));
    report::write_convergence_table(&table, &traces)?;
    let summary_path = cli.output_dir.join(report::summary_file_name(
        cli.function,
        cli.subdim,
        cli.popsize,
        cli.metamodel,
    ));
    report::write_summaries(&summary_path, &summaries)?;

    let errors: Vec<f64> = summaries.iter().map(|s| s.best_error).collect();
    let mean = errors.iter().sum::<f64>() / errors.len() as f64;
    let best = errors.iter().copied().fold(f64::INFINITY, f64::min);
    let worst = errors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    info!(
        mean_error = mean,
        best_error = best,
        worst_error = worst,
        table = %table.display(),
        "experiment finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.json_logs || logging::should_use_json(), &cli.log_level)?;
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("saccjade").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.function, 1);
        assert_eq!(cli.metamodel, SurrogateKind::None);
        assert_eq!(cli.iterations, 5);
        assert_eq!(cli.dimension, 1000);
        assert_eq!(cli.subdim, 5);
        assert_eq!(cli.popsize, 10);
        assert_eq!(cli.fevals, 10_000);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn short_flags_and_metamodel_names() {
        let cli = parse(&["-f", "3", "-m", "rbfn", "-r", "4", "-d", "50", "-s", "10", "-p", "20"]);
        assert_eq!(cli.function, 3);
        assert_eq!(cli.metamodel, SurrogateKind::Rbfn);
        assert_eq!(cli.repetitions, 4);
        assert_eq!(cli.config().group_count(cli.dimension), 5);
        assert_eq!(parse(&["-m", "2"]).metamodel, SurrogateKind::Quadratic);
    }

    #[test]
    fn unknown_metamodel_is_a_parse_error() {
        assert!(Cli::try_parse_from(["saccjade", "-m", "kriging"]).is_err());
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        assert!(parse(&["-f", "0"]).validate().is_err());
        assert!(parse(&["-f", "7"]).validate().is_err());
        assert!(parse(&["-r", "101"]).validate().is_err());
        assert!(parse(&["-d", "1001"]).validate().is_err());
        assert!(parse(&["-d", "4", "-s", "5"]).validate().is_err());
        assert!(parse(&["-p", "3"]).validate().is_err());
    }

    #[test]
    fn repetitions_are_seeded_by_index() {
        let cli = parse(&["-d", "6", "-s", "3", "-p", "5", "-e", "400", "-r", "3"]);
        let benchmark = Benchmark::from_index(cli.function, cli.dimension).unwrap();
        let results = run_repetitions(&cli.config(), &benchmark, 3).unwrap();
        assert_eq!(results.len(), 3);

        let mut trace = Vec::new();
        Ccde::new(cli.config().with_seed(2))
            .optimize(&benchmark, &mut trace)
            .unwrap();
        assert_eq!(results[2].0, trace);
    }

    #[test]
    fn run_writes_table_and_summaries() {
        let dir = tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let cli = parse(&[
            "-f", "3", "-m", "qpa", "-d", "4", "-s", "2", "-p", "6", "-e", "500", "-r", "2", "-o",
            out,
        ]);
        run(&cli).unwrap();

        let table = dir.path().join("convplot_f3_dec2_popsize6_QPA_SACCJADE.csv");
        let text = std::fs::read_to_string(table).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(first.split(';').count(), 4);
        assert!(dir
            .path()
            .join("summary_f3_dec2_popsize6_QPA_SACCJADE.json")
            .exists());
    }
}
