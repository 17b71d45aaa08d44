//! The cooperative-coevolution driver.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sacc_types::{validate_bounds, CcdeConfig, ConvergencePoint, Fitness, RunSummary, SaccResult};
use std::time::Instant;
use tracing::{debug, info};

use crate::decomposer::{Decomposer, DecomposerSettings};

/// Runs surrogate-assisted cooperative coevolution with JADE subcomponents
/// under a hard budget of true fitness evaluations.
#[derive(Debug, Clone)]
pub struct Ccde {
    config: CcdeConfig,
}

impl Ccde {
    pub fn new(config: CcdeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CcdeConfig {
        &self.config
    }

    /// Optimize `fitness`, appending one convergence point after
    /// initialization and one per cycle to `convergence`.
    ///
    /// The budget is polled between optimizer calls, never during one, so the
    /// final count may exceed `max_evaluations` by at most one optimizer's
    /// worst case: `population * (generations_per_cycle + 1)`, the extra
    /// generation's worth being the parent re-evaluation after a context
    /// change.
    pub fn optimize(
        &self,
        fitness: &dyn Fitness,
        convergence: &mut Vec<ConvergencePoint>,
    ) -> SaccResult<RunSummary> {
        let dimension = fitness.dimension();
        self.config.validate(dimension)?;
        validate_bounds(fitness)?;

        let started_at = Utc::now();
        let clock = Instant::now();
        let config = &self.config;
        let bounds = (fitness.lower_bound(), fitness.upper_bound());
        let optimum = fitness.optimum();
        let np = config.individuals_per_subcomponent;

        info!(
            function = fitness.name(),
            dimension,
            groups = config.group_count(dimension),
            surrogate = %config.surrogate,
            budget = config.max_evaluations,
            seed = config.seed,
            "starting cooperative coevolution"
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let population = init_population(np, dimension, bounds, &mut rng);

        let context_vector = population[0].clone();
        let context_fitness = fitness.evaluate(&context_vector);
        let mut evaluations = 1usize;

        let settings = DecomposerSettings {
            randomize: config.random_grouping,
            group_size: config.subcomponent_size,
            population_size: np,
            surrogate: config.surrogate,
            jade: config.jade,
            bounds,
        };
        let mut decomposer =
            Decomposer::new(settings, population, context_vector, context_fitness, rng.random());
        let groups = decomposer.optimizer_count();

        for i in 0..groups {
            evaluations += decomposer.evaluate_parents(i, fitness);
        }
        let error = (decomposer.best_fitness() - optimum).abs();
        convergence.push(ConvergencePoint::new(evaluations, error, 0.0));
        info!(cycle = 0, evaluations, error, "initialized");

        let worst_case_call = np * (config.generations_per_cycle + 1);
        let regroup_margin = groups * np + groups;
        let mut cycles = 0usize;

        while evaluations < config.max_evaluations {
            for i in 0..decomposer.optimizer_count() {
                evaluations +=
                    decomposer.run_optimizer(i, config.generations_per_cycle, fitness)?;
                if config.max_evaluations.saturating_sub(evaluations) < worst_case_call {
                    debug!(group = i, evaluations, "budget nearly spent, ending cycle early");
                    break;
                }
            }

            decomposer.build_context_vector(fitness);
            evaluations += 1;
            decomposer.empty_archives();
            let stats = decomposer.take_surrogate_stats();

            if config.random_grouping && evaluations + regroup_margin <= config.max_evaluations {
                evaluations += decomposer.random_grouping(fitness);
            }

            cycles += 1;
            let error = (decomposer.best_fitness() - optimum).abs();
            let surrogate_error = stats.mean_error().unwrap_or(0.0);
            convergence.push(ConvergencePoint::new(evaluations, error, surrogate_error));
            info!(
                cycle = cycles,
                evaluations,
                error,
                rejected = stats.rejected,
                surrogate_error,
                "cycle complete"
            );
        }

        let elapsed_seconds = clock.elapsed().as_secs_f64();
        let best_fitness = decomposer.best_fitness();
        let best_error = (best_fitness - optimum).abs();
        info!(elapsed_seconds, best_error, evaluations, cycles, "optimization finished");

        Ok(RunSummary {
            best_fitness,
            best_error,
            best_position: decomposer.best_position().to_vec(),
            evaluations,
            cycles,
            elapsed_seconds,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// `count` individuals drawn uniformly within `bounds`.
fn init_population(
    count: usize,
    dimension: usize,
    bounds: (f64, f64),
    rng: &mut StdRng,
) -> Vec<Vec<f64>> {
    let (lower, upper) = bounds;
    (0..count)
        .map(|_| {
            (0..dimension)
                .map(|_| lower + rng.random::<f64>() * (upper - lower))
                .collect()
        })
        .collect()
}
