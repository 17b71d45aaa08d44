//! JADE: adaptive differential evolution for a single subcomponent.
//!
//! Each optimizer owns a sub-population over a fixed subset of coordinates.
//! Its individuals are scored by writing them into a copy of the shared
//! context vector, so the rest of the solution stays fixed while this
//! subcomponent evolves.
//!
//! Mutation is DE/current-to-pbest/1 with an external archive, crossover is
//! binomial, and the per-individual `F` and `CR` are drawn around `mu_f` and
//! `mu_cr`, which learn from the successful trials of every generation.
//! When a surrogate is configured, trials it predicts to be no better than
//! their parent are discarded without spending a true evaluation.
//!
//! Parent fitness values and surrogate samples are only meaningful for the
//! context vector they were measured against. When an optimization call sees
//! a different context, the optimizer drops its samples and fit and truly
//! re-evaluates its parents before evolving.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Cauchy, Distribution, Normal};
use sacc_types::{internal_error, Fitness, JadeParams, SaccResult, SurrogateKind};
use tracing::{debug, trace};

use crate::archive::Archive;
use crate::surrogate::{build_surrogate, SampleWindow, Surrogate};

/// Spread of the normal distribution `CR` is drawn from.
const CR_SPREAD: f64 = 0.1;
/// Scale of the Cauchy distribution `F` is drawn from.
const F_SPREAD: f64 = 0.1;
const INITIAL_MU: f64 = 0.5;

/// Reflect a coordinate that left `[lower, upper]` back inside, clipping if
/// the reflection overshoots the opposite bound.
///
/// This is the only bound-repair rule used by the optimizer.
pub fn reflect_into_bounds(value: f64, lower: f64, upper: f64) -> f64 {
    if value < lower {
        (2.0 * lower - value).min(upper)
    } else if value > upper {
        (2.0 * upper - value).max(lower)
    } else {
        value
    }
}

/// Write `sub` into `scratch` (a copy of `context`) at `coordinates`.
fn embed(scratch: &mut [f64], context: &[f64], coordinates: &[usize], sub: &[f64]) {
    scratch.copy_from_slice(context);
    for (&c, &v) in coordinates.iter().zip(sub) {
        scratch[c] = v;
    }
}

/// Counters describing how the surrogate was used since the last
/// [`Jade::take_surrogate_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurrogateStats {
    /// Trials scored by the surrogate.
    pub screened: usize,
    /// Screened trials discarded without a true evaluation.
    pub rejected: usize,
    /// Screened trials that were also truly evaluated.
    pub checked: usize,
    /// Sum of |prediction - true value| over checked trials.
    pub abs_error_sum: f64,
}

impl SurrogateStats {
    pub fn mean_error(&self) -> Option<f64> {
        (self.checked > 0).then(|| self.abs_error_sum / self.checked as f64)
    }

    pub fn merge(&mut self, other: &SurrogateStats) {
        self.screened += other.screened;
        self.rejected += other.rejected;
        self.checked += other.checked;
        self.abs_error_sum += other.abs_error_sum;
    }
}

/// A trial vector with the control parameters that produced it.
struct Trial {
    genome: Vec<f64>,
    f: f64,
    cr: f64,
}

/// Per-subcomponent JADE optimizer.
#[derive(Debug)]
pub struct Jade {
    coordinates: Vec<usize>,
    population: Vec<Vec<f64>>,
    fitness_values: Vec<f64>,
    lower: f64,
    upper: f64,
    params: JadeParams,
    mu_f: f64,
    mu_cr: f64,
    archive: Archive,
    surrogate: Box<dyn Surrogate>,
    samples: SampleWindow,
    rng: StdRng,
    scratch: Vec<f64>,
    /// Context the parent values and samples were measured against.
    measured_context: Vec<f64>,
    nfe: usize,
    stats: SurrogateStats,
}

impl Jade {
    /// Create an optimizer over `coordinates` with `population_size`
    /// individuals. The population is empty (all zeros, unevaluated) until
    /// [`Jade::load_individuals`] and [`Jade::evaluate_parents`] run.
    pub fn new(
        coordinates: Vec<usize>,
        population_size: usize,
        bounds: (f64, f64),
        params: JadeParams,
        surrogate: SurrogateKind,
        seed: u64,
    ) -> Self {
        let width = coordinates.len();
        let surrogate = build_surrogate(surrogate, width);
        let window = if surrogate.min_samples() == usize::MAX {
            0
        } else {
            (2 * surrogate.min_samples()).max(2 * population_size)
        };
        let archive_capacity = (params.archive_factor * population_size as f64).round() as usize;

        Self {
            coordinates,
            population: vec![vec![0.0; width]; population_size],
            fitness_values: vec![f64::INFINITY; population_size],
            lower: bounds.0,
            upper: bounds.1,
            params,
            mu_f: INITIAL_MU,
            mu_cr: INITIAL_MU,
            archive: Archive::new(archive_capacity),
            surrogate,
            samples: SampleWindow::new(window),
            rng: StdRng::seed_from_u64(seed),
            scratch: Vec::new(),
            measured_context: Vec::new(),
            nfe: 0,
            stats: SurrogateStats::default(),
        }
    }

    /// Copy this group's coordinates of every shared individual into the
    /// sub-population.
    pub fn load_individuals(&mut self, shared: &[Vec<f64>]) {
        for (own, full) in self.population.iter_mut().zip(shared) {
            for (slot, &c) in own.iter_mut().zip(&self.coordinates) {
                *slot = full[c];
            }
        }
    }

    /// Write the sub-population back into this group's coordinates of the
    /// shared individuals.
    pub fn store_individuals(&self, shared: &mut [Vec<f64>]) {
        for (own, full) in self.population.iter().zip(shared.iter_mut()) {
            for (&value, &c) in own.iter().zip(&self.coordinates) {
                full[c] = value;
            }
        }
    }

    /// Truly evaluate every individual against `context`.
    pub fn evaluate_parents(&mut self, fitness: &dyn Fitness, context: &[f64]) {
        self.scratch.resize(context.len(), 0.0);
        self.measured_context.clear();
        self.measured_context.extend_from_slice(context);
        for i in 0..self.population.len() {
            embed(&mut self.scratch, context, &self.coordinates, &self.population[i]);
            let value = fitness.evaluate(&self.scratch);
            self.nfe += 1;
            self.fitness_values[i] = value;
            self.samples.push(&self.population[i], value);
        }
    }

    /// Run `generations` JADE generations against `context`.
    ///
    /// If `context` differs from the one the parents were last evaluated
    /// against, the sample window and surrogate fit are discarded and the
    /// parents are re-evaluated first, spending `population_size` extra
    /// evaluations.
    pub fn optimize(
        &mut self,
        generations: usize,
        fitness: &dyn Fitness,
        context: &[f64],
    ) -> SaccResult<()> {
        if self.measured_context != context {
            self.refresh(fitness, context);
        }
        for _ in 0..generations {
            self.generation(fitness, context)?;
        }
        Ok(())
    }

    fn refresh(&mut self, fitness: &dyn Fitness, context: &[f64]) {
        debug!(
            width = self.coordinates.len(),
            samples = self.samples.len(),
            "context changed, re-evaluating parents"
        );
        self.samples.clear();
        self.surrogate.reset();
        self.evaluate_parents(fitness, context);
    }

    fn generation(&mut self, fitness: &dyn Fitness, context: &[f64]) -> SaccResult<()> {
        let np = self.population.len();
        let cr_dist = Normal::new(self.mu_cr, CR_SPREAD)
            .map_err(|e| internal_error!("CR distribution around {}: {e}", self.mu_cr))?;
        let f_dist = Cauchy::new(self.mu_f, F_SPREAD)
            .map_err(|e| internal_error!("F distribution around {}: {e}", self.mu_f))?;

        let gated = match self.surrogate.fit(self.samples.points(), self.samples.values()) {
            Ok(()) => true,
            Err(e) => {
                trace!(model = self.surrogate.name(), error = %e, "surrogate unavailable, evaluating all trials");
                false
            }
        };

        let trials: Vec<Trial> = {
            let mut order: Vec<usize> = (0..np).collect();
            order.sort_by(|&a, &b| self.fitness_values[a].total_cmp(&self.fitness_values[b]));
            let p_count = ((self.params.p * np as f64).round() as usize).clamp(1, np);
            (0..np)
                .map(|i| self.make_trial(i, &order[..p_count], &cr_dist, &f_dist))
                .collect()
        };

        let mut success_f = Vec::new();
        let mut success_cr = Vec::new();
        let mut truly_evaluated = 0usize;
        let mut best_rejected: Option<(usize, f64)> = None;
        let mut pending = Vec::with_capacity(np);

        for (i, trial) in trials.iter().enumerate() {
            if gated {
                if let Ok(predicted) = self.surrogate.predict(&trial.genome) {
                    self.stats.screened += 1;
                    if predicted >= self.fitness_values[i] {
                        self.stats.rejected += 1;
                        if best_rejected.map_or(true, |(_, p)| predicted < p) {
                            best_rejected = Some((i, predicted));
                        }
                        continue;
                    }
                    pending.push((i, Some(predicted)));
                    continue;
                }
            }
            pending.push((i, None));
        }

        // A fully rejected generation still refreshes the model with its most
        // promising trial.
        if pending.is_empty() {
            if let Some((i, predicted)) = best_rejected {
                self.stats.rejected -= 1;
                pending.push((i, Some(predicted)));
            }
        }

        for (i, predicted) in pending {
            let trial = &trials[i];
            embed(&mut self.scratch, context, &self.coordinates, &trial.genome);
            let value = fitness.evaluate(&self.scratch);
            self.nfe += 1;
            truly_evaluated += 1;
            self.samples.push(&trial.genome, value);

            if let Some(predicted) = predicted {
                self.stats.checked += 1;
                self.stats.abs_error_sum += (predicted - value).abs();
            }

            if value <= self.fitness_values[i] {
                self.archive.insert(&self.population[i], &mut self.rng);
                self.population[i].copy_from_slice(&trial.genome);
                self.fitness_values[i] = value;
                success_f.push(trial.f);
                success_cr.push(trial.cr);
            }
        }

        self.adapt(&success_f, &success_cr);
        trace!(
            evaluated = truly_evaluated,
            successes = success_f.len(),
            mu_f = self.mu_f,
            mu_cr = self.mu_cr,
            "generation complete"
        );
        Ok(())
    }

    /// Build the trial for target `i` from DE/current-to-pbest/1/bin.
    fn make_trial(
        &mut self,
        i: usize,
        top: &[usize],
        cr_dist: &Normal<f64>,
        f_dist: &Cauchy<f64>,
    ) -> Trial {
        let np = self.population.len();
        let width = self.coordinates.len();

        let cr = cr_dist.sample(&mut self.rng).clamp(0.0, 1.0);
        let f = loop {
            let f = f_dist.sample(&mut self.rng);
            if f > 0.0 && f.is_finite() {
                break f.min(1.0);
            }
        };

        let pbest = top[self.rng.random_range(0..top.len())];
        let r1 = loop {
            let r = self.rng.random_range(0..np);
            if r != i {
                break r;
            }
        };
        let pool = np + self.archive.len();
        let r2 = loop {
            let r = self.rng.random_range(0..pool);
            if r != i && r != r1 {
                break r;
            }
        };

        let x = &self.population[i];
        let xp = &self.population[pbest];
        let x1 = &self.population[r1];
        let x2 = if r2 < np {
            self.population[r2].as_slice()
        } else {
            self.archive.get(r2 - np).unwrap_or(x1.as_slice())
        };

        let j_rand = self.rng.random_range(0..width);
        let mut genome = x.clone();
        for j in 0..width {
            if j == j_rand || self.rng.random::<f64>() < cr {
                let v = x[j] + f * (xp[j] - x[j]) + f * (x1[j] - x2[j]);
                genome[j] = reflect_into_bounds(v, self.lower, self.upper);
            }
        }

        Trial { genome, f, cr }
    }

    /// Move `mu_cr` toward the arithmetic mean and `mu_f` toward the Lehmer
    /// mean of the successful parameters. No-op without successes.
    fn adapt(&mut self, success_f: &[f64], success_cr: &[f64]) {
        if success_f.is_empty() {
            return;
        }
        let c = self.params.c;
        let mean_cr = success_cr.iter().sum::<f64>() / success_cr.len() as f64;
        let sum_f: f64 = success_f.iter().sum();
        let lehmer_f = success_f.iter().map(|f| f * f).sum::<f64>() / sum_f;

        self.mu_cr = (1.0 - c) * self.mu_cr + c * mean_cr;
        self.mu_f = (1.0 - c) * self.mu_f + c * lehmer_f;
    }

    /// Forget the archive; it only makes sense for the current assignment.
    pub fn empty_archive(&mut self) {
        self.archive.clear();
    }

    /// Index of the best individual (first one on ties).
    pub fn best_index(&self) -> usize {
        self.fitness_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Best sub-individual and its last known fitness.
    pub fn best(&self) -> (&[f64], f64) {
        let i = self.best_index();
        (&self.population[i], self.fitness_values[i])
    }

    /// True evaluations since the last [`Jade::take_nfe`].
    pub fn nfe(&self) -> usize {
        self.nfe
    }

    /// Return the true-evaluation count and reset it to zero.
    pub fn take_nfe(&mut self) -> usize {
        std::mem::take(&mut self.nfe)
    }

    pub fn take_surrogate_stats(&mut self) -> SurrogateStats {
        std::mem::take(&mut self.stats)
    }

    pub fn coordinates(&self) -> &[usize] {
        &self.coordinates
    }

    pub fn population(&self) -> &[Vec<f64>] {
        &self.population
    }

    pub fn fitness_values(&self) -> &[f64] {
        &self.fitness_values
    }

    pub fn population_size(&self) -> usize {
        self.population.len()
    }

    pub fn width(&self) -> usize {
        self.coordinates.len()
    }

    pub fn mu_f(&self) -> f64 {
        self.mu_f
    }

    pub fn mu_cr(&self) -> f64 {
        self.mu_cr
    }

    pub fn archive_len(&self) -> usize {
        self.archive.len()
    }
}
