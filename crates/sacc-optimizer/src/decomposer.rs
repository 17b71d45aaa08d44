//! Decomposition of the search space into cooperating subcomponents.
//!
//! The [`Decomposer`] is the single owner of the shared population and the
//! context vector. Optimizers only see them at the hand-off points: load and
//! store around each optimization call, and the context-vector rebuild.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sacc_types::{Fitness, JadeParams, SaccResult, SurrogateKind};
use tracing::debug;

use crate::assignment::CoordinateAssignment;
use crate::jade::{Jade, SurrogateStats};

/// How subcomponents are laid out and optimized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposerSettings {
    /// Shuffle coordinates before cutting them into groups.
    pub randomize: bool,
    pub group_size: usize,
    pub population_size: usize,
    pub surrogate: SurrogateKind,
    pub jade: JadeParams,
    /// Uniform lower and upper bound of every coordinate.
    pub bounds: (f64, f64),
}

/// Owner of the coordinate assignment, one [`Jade`] per group, the shared
/// population and the context vector.
#[derive(Debug)]
pub struct Decomposer {
    settings: DecomposerSettings,
    assignment: CoordinateAssignment,
    optimizers: Vec<Jade>,
    population: Vec<Vec<f64>>,
    context_vector: Vec<f64>,
    context_fitness: f64,
    best_fitness: f64,
    best_position: Vec<f64>,
    rng: StdRng,
}

impl Decomposer {
    /// Partition the coordinates of `context_vector` and build one optimizer
    /// per group, loaded with its projection of `population`.
    ///
    /// `context_fitness` is the true fitness of `context_vector`; it seeds the
    /// best-achieved record. Optimizers start unevaluated.
    pub fn new(
        settings: DecomposerSettings,
        population: Vec<Vec<f64>>,
        context_vector: Vec<f64>,
        context_fitness: f64,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let assignment = Self::make_assignment(&settings, context_vector.len(), &mut rng);

        let mut decomposer = Self {
            settings,
            assignment,
            optimizers: Vec::new(),
            population,
            best_position: context_vector.clone(),
            context_vector,
            context_fitness,
            best_fitness: context_fitness,
            rng,
        };
        decomposer.rebuild_optimizers();
        decomposer
    }

    fn make_assignment(
        settings: &DecomposerSettings,
        dimension: usize,
        rng: &mut StdRng,
    ) -> CoordinateAssignment {
        if settings.randomize {
            CoordinateAssignment::shuffled(dimension, settings.group_size, rng)
        } else {
            CoordinateAssignment::sequential(dimension, settings.group_size)
        }
    }

    /// Replace every optimizer with a fresh one for the current assignment.
    fn rebuild_optimizers(&mut self) {
        let settings = self.settings;
        self.optimizers = self
            .assignment
            .groups()
            .iter()
            .map(|group| {
                let seed = self.rng.random::<u64>();
                let mut optimizer = Jade::new(
                    group.clone(),
                    settings.population_size,
                    settings.bounds,
                    settings.jade,
                    settings.surrogate,
                    seed,
                );
                optimizer.load_individuals(&self.population);
                optimizer
            })
            .collect();
    }

    /// Truly evaluate the parents of optimizer `index` against the current
    /// context vector. Returns the evaluations spent.
    pub fn evaluate_parents(&mut self, index: usize, fitness: &dyn Fitness) -> usize {
        let optimizer = &mut self.optimizers[index];
        optimizer.load_individuals(&self.population);
        optimizer.evaluate_parents(fitness, &self.context_vector);
        optimizer.take_nfe()
    }

    /// Load, evolve for `generations` and store back optimizer `index`.
    /// Returns the true evaluations spent, including the parent
    /// re-evaluation an optimizer does when the context moved since its
    /// last call.
    pub fn run_optimizer(
        &mut self,
        index: usize,
        generations: usize,
        fitness: &dyn Fitness,
    ) -> SaccResult<usize> {
        let optimizer = &mut self.optimizers[index];
        optimizer.load_individuals(&self.population);
        optimizer.optimize(generations, fitness, &self.context_vector)?;
        optimizer.store_individuals(&mut self.population);
        Ok(optimizer.take_nfe())
    }

    /// Assemble the context vector from every group's best sub-individual and
    /// truly evaluate it (one evaluation). Updates the best-achieved record
    /// when the new vector improves on it. Returns the new context fitness.
    ///
    /// Optimizers notice the new context at their next run and re-evaluate
    /// their parents against it.
    pub fn build_context_vector(&mut self, fitness: &dyn Fitness) -> f64 {
        for optimizer in &self.optimizers {
            let (best, _) = optimizer.best();
            for (&c, &v) in optimizer.coordinates().iter().zip(best) {
                self.context_vector[c] = v;
            }
        }

        self.context_fitness = fitness.evaluate(&self.context_vector);
        if self.context_fitness < self.best_fitness {
            self.best_fitness = self.context_fitness;
            self.best_position.copy_from_slice(&self.context_vector);
        }
        self.context_fitness
    }

    /// Draw a new coordinate assignment and rebuild all optimizers on it.
    ///
    /// Each new optimizer is loaded from the shared population and its
    /// parents are truly evaluated against the current context vector, so
    /// this spends `groups * population_size` evaluations, which are returned.
    pub fn random_grouping(&mut self, fitness: &dyn Fitness) -> usize {
        self.assignment =
            Self::make_assignment(&self.settings, self.context_vector.len(), &mut self.rng);
        self.rebuild_optimizers();
        debug!(groups = self.assignment.len(), "coordinates regrouped");

        (0..self.optimizers.len())
            .map(|i| self.evaluate_parents(i, fitness))
            .sum()
    }

    pub fn empty_archives(&mut self) {
        for optimizer in &mut self.optimizers {
            optimizer.empty_archive();
        }
    }

    /// Surrogate usage across all optimizers since the last call.
    pub fn take_surrogate_stats(&mut self) -> SurrogateStats {
        let mut total = SurrogateStats::default();
        for optimizer in &mut self.optimizers {
            total.merge(&optimizer.take_surrogate_stats());
        }
        total
    }

    pub fn optimizers(&self) -> &[Jade] {
        &self.optimizers
    }

    pub fn optimizer_count(&self) -> usize {
        self.optimizers.len()
    }

    pub fn assignment(&self) -> &CoordinateAssignment {
        &self.assignment
    }

    pub fn population(&self) -> &[Vec<f64>] {
        &self.population
    }

    pub fn population_size(&self) -> usize {
        self.settings.population_size
    }

    pub fn context_vector(&self) -> &[f64] {
        &self.context_vector
    }

    pub fn context_fitness(&self) -> f64 {
        self.context_fitness
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    pub fn best_position(&self) -> &[f64] {
        &self.best_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sphere(usize);

    impl Fitness for Sphere {
        fn dimension(&self) -> usize {
            self.0
        }
        fn lower_bound(&self) -> f64 {
            -5.0
        }
        fn upper_bound(&self) -> f64 {
            5.0
        }
        fn evaluate(&self, x: &[f64]) -> f64 {
            x.iter().map(|v| v * v).sum()
        }
    }

    fn settings(group_size: usize, randomize: bool) -> DecomposerSettings {
        DecomposerSettings {
            randomize,
            group_size,
            population_size: 6,
            surrogate: SurrogateKind::None,
            jade: JadeParams::default(),
            bounds: (-5.0, 5.0),
        }
    }

    fn decomposer(dim: usize, group_size: usize, randomize: bool) -> (Decomposer, Sphere) {
        let f = Sphere(dim);
        let mut rng = StdRng::seed_from_u64(8);
        let population: Vec<Vec<f64>> = (0..6)
            .map(|_| (0..dim).map(|_| rng.random_range(-5.0..5.0)).collect())
            .collect();
        let context = population[0].clone();
        let fit = f.evaluate(&context);
        (
            Decomposer::new(settings(group_size, randomize), population, context, fit, 1),
            f,
        )
    }

    #[test]
    fn ten_dimensions_in_groups_of_five() {
        let (dec, _) = decomposer(10, 5, true);
        assert_eq!(dec.optimizer_count(), 2);
        assert!(dec.optimizers().iter().all(|o| o.width() == 5));
        assert!(dec.assignment().is_partition());
    }

    #[test]
    fn sequential_assignment_when_not_randomized() {
        let (dec, _) = decomposer(6, 4, false);
        assert_eq!(dec.optimizers()[0].coordinates(), &[0, 1, 2, 3]);
        assert_eq!(dec.optimizers()[1].coordinates(), &[4, 5]);
    }

    #[test]
    fn optimizers_start_with_population_projection() {
        let (dec, _) = decomposer(8, 3, true);
        for optimizer in dec.optimizers() {
            for (own, full) in optimizer.population().iter().zip(dec.population()) {
                let projected: Vec<f64> = optimizer.coordinates().iter().map(|&c| full[c]).collect();
                assert_eq!(own, &projected);
            }
        }
    }

    #[test]
    fn evaluate_parents_spends_population_size() {
        let (mut dec, f) = decomposer(10, 5, true);
        assert_eq!(dec.evaluate_parents(0, &f), 6);
        assert_eq!(dec.evaluate_parents(1, &f), 6);
    }

    #[test]
    fn build_context_vector_is_idempotent() {
        let (mut dec, f) = decomposer(10, 5, true);
        for i in 0..dec.optimizer_count() {
            dec.evaluate_parents(i, &f);
            dec.run_optimizer(i, 3, &f).unwrap();
        }
        let first = dec.build_context_vector(&f);
        let first_vector = dec.context_vector().to_vec();
        let second = dec.build_context_vector(&f);
        assert_eq!(first, second);
        assert_eq!(first_vector, dec.context_vector());
    }

    #[test]
    fn context_uses_each_groups_best() {
        let (mut dec, f) = decomposer(9, 3, true);
        for i in 0..dec.optimizer_count() {
            dec.evaluate_parents(i, &f);
        }
        dec.build_context_vector(&f);
        for optimizer in dec.optimizers() {
            let (best, _) = optimizer.best();
            for (&c, &v) in optimizer.coordinates().iter().zip(best) {
                assert_eq!(dec.context_vector()[c], v);
            }
        }
    }

    #[test]
    fn best_fitness_never_increases() {
        let (mut dec, f) = decomposer(10, 5, true);
        let mut best = dec.best_fitness();
        for i in 0..dec.optimizer_count() {
            dec.evaluate_parents(i, &f);
        }
        for _ in 0..5 {
            for i in 0..dec.optimizer_count() {
                dec.run_optimizer(i, 2, &f).unwrap();
            }
            dec.build_context_vector(&f);
            assert!(dec.best_fitness() <= best);
            best = dec.best_fitness();
            assert_eq!(f.evaluate(dec.best_position()), best);
            dec.random_grouping(&f);
        }
    }

    #[test]
    fn regrouping_keeps_a_partition_and_the_population() {
        let (mut dec, f) = decomposer(13, 4, true);
        let before = dec.population().to_vec();
        let old = dec.assignment().clone();

        let spent = dec.random_grouping(&f);
        assert_eq!(spent, dec.optimizer_count() * dec.population_size());
        assert!(dec.assignment().is_partition());
        assert_eq!(dec.assignment().len(), 4);
        assert_ne!(&old, dec.assignment());
        assert_eq!(dec.population(), before.as_slice());
    }

    #[test]
    fn run_then_store_only_touches_owned_coordinates() {
        let (mut dec, f) = decomposer(10, 5, false);
        let before = dec.population().to_vec();
        dec.evaluate_parents(0, &f);
        dec.run_optimizer(0, 4, &f).unwrap();
        for (after, prior) in dec.population().iter().zip(&before) {
            assert_eq!(&after[5..], &prior[5..]);
        }
    }

    #[test]
    fn parents_follow_the_rebuilt_context() {
        let (mut dec, f) = decomposer(10, 5, false);
        for i in 0..dec.optimizer_count() {
            dec.evaluate_parents(i, &f);
            assert_eq!(dec.run_optimizer(i, 2, &f).unwrap(), 6 * 2);
        }
        let before = dec.context_vector().to_vec();
        dec.build_context_vector(&f);
        let refresh = if before == dec.context_vector() { 0 } else { 6 };

        assert_eq!(dec.run_optimizer(0, 2, &f).unwrap(), refresh + 6 * 2);
        let optimizer = &dec.optimizers()[0];
        for (sub, &value) in optimizer.population().iter().zip(optimizer.fitness_values()) {
            let mut full = dec.context_vector().to_vec();
            for (&c, &v) in optimizer.coordinates().iter().zip(sub) {
                full[c] = v;
            }
            assert_eq!(value, f.evaluate(&full));
        }
    }
}
