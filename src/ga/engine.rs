//! Evolutionary loop execution.
//!
//! [`EvolutionEngine`] orchestrates the search: a deduplicated random
//! population, then per generation elitism, tournament selection, order
//! crossover, mutation, fingerprint-checked acceptance, and data-parallel
//! fitness evaluation on a dedicated rayon pool. Generations are strict
//! barriers; within one, every non-elite individual is simulated
//! independently against the shared read-only context.
//!
//! When the sum of the top-3 fitnesses stays unchanged for
//! [`STAGNATION_GENERATIONS`] generations, the operator knobs are re-rolled
//! to push the search out of the basin.

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::individual::{fingerprint_permutation, Individual};
use super::operators::{self, OperatorKnobs};
use crate::models::{Schedule, SchedulingContext};
use crate::scheduler::ScheduleBuilder;

/// Generations of an unchanged top-3 fitness sum before the operator knobs
/// are re-rolled.
pub const STAGNATION_GENERATIONS: usize = 50;

/// Rejected duplicate children tolerated per generation, as a multiple of
/// the population size, before the breeder refills with fresh randoms.
const DUPLICATE_RETRY_FACTOR: usize = 20;

/// Redraw attempts per slot when refilling with random permutations before
/// a duplicate is accepted anyway (tiny search spaces have fewer distinct
/// permutations than population slots).
const RANDOM_REDRAW_ATTEMPTS: usize = 16;

/// Outcome of an evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Final population, sorted ascending by fitness.
    pub population: Vec<Individual>,
    /// Generations executed.
    pub generations: usize,
    /// Best fitness after initialisation and after each generation.
    pub fitness_history: Vec<f64>,
    /// How often stagnation re-rolled the operator knobs.
    pub stagnation_resets: usize,
    /// Whether the best individual schedules every task with a full crew.
    pub feasible: bool,
}

impl EvolutionResult {
    /// The best individual of the final population.
    pub fn best(&self) -> &Individual {
        self.population
            .first()
            .expect("population is never empty after a run")
    }

    /// The best individual decoded into consumer-facing rows.
    pub fn best_schedule(&self, ctx: &SchedulingContext) -> Schedule {
        Schedule::from_individual(self.best(), ctx)
    }
}

/// Runs the evolutionary schedule search over one context.
pub struct EvolutionEngine<'a> {
    ctx: &'a SchedulingContext,
}

impl<'a> EvolutionEngine<'a> {
    /// Creates an engine over the shared context.
    pub fn new(ctx: &'a SchedulingContext) -> Self {
        Self { ctx }
    }

    /// Executes the full run and returns the ranked population.
    ///
    /// # Panics
    /// Panics if the configuration is invalid (call
    /// [`SchedulerConfig::validate`](crate::SchedulerConfig::validate) first
    /// for a descriptive error).
    pub fn run(&self) -> EvolutionResult {
        let config = &self.ctx.config;
        config.validate().expect("invalid SchedulerConfig");

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads_num)
            .build()
            .expect("failed to build evaluation thread pool");
        let builder = ScheduleBuilder::new(self.ctx);

        info!(
            tasks = self.ctx.tasks.len(),
            workers = self.ctx.workers.len(),
            population = config.population_size,
            generations = config.generations_limit,
            "starting evolutionary schedule search"
        );

        // Initial population: random permutations, collisions redrawn.
        let mut population: Vec<Individual> = Vec::with_capacity(config.population_size);
        let mut seen: HashMap<u64, usize> = HashMap::new();
        self.fill_with_randoms(&mut population, &mut seen, config.population_size, &mut rng);

        pool.install(|| {
            population.par_iter_mut().for_each(|individual| {
                builder.evaluate(individual);
            });
        });
        sort_ascending(&mut population);

        let mut fitness_history = Vec::with_capacity(config.generations_limit + 1);
        fitness_history.push(population[0].fitness);

        let mut knobs = OperatorKnobs::from_config(config);
        let mut stagnation_counter = 0usize;
        let mut stagnation_resets = 0usize;
        let mut top3 = top3_sum(&population);

        for generation in 0..config.generations_limit {
            let elites = (config.elitism_rate * config.population_size as f64) as usize;
            let mut next: Vec<Individual> = population[..elites.min(population.len())].to_vec();
            let mut seen: HashMap<u64, usize> = next
                .iter()
                .enumerate()
                .map(|(index, individual)| (individual.fingerprint(), index))
                .collect();

            let retry_limit = config.population_size * DUPLICATE_RETRY_FACTOR;
            let mut rejected = 0usize;
            while next.len() < config.population_size {
                if rejected > retry_limit {
                    warn!(
                        generation,
                        rejected,
                        "breeding collapsed onto existing fingerprints; refilling with random permutations"
                    );
                    let remaining = config.population_size - next.len();
                    self.fill_with_randoms(&mut next, &mut seen, remaining, &mut rng);
                    break;
                }

                let parent_indices = operators::tournament_select(
                    &population,
                    knobs.crossover_parents_number,
                    knobs.tourney_sample_size,
                    &mut rng,
                );
                let parent_perms: Vec<Vec<String>> = parent_indices
                    .iter()
                    .map(|&index| population[index].permutation())
                    .collect();

                let child_perms = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    operators::order_crossover(&parent_perms, knobs.max_crossover_length, &mut rng)
                } else {
                    parent_perms
                };

                for mut permutation in child_perms {
                    if next.len() >= config.population_size {
                        break;
                    }
                    if rng.random_range(0.0..1.0) < config.mutation_rate {
                        operators::mutate(&mut permutation, &knobs, &mut rng);
                    }
                    let fingerprint = fingerprint_permutation(&permutation);
                    if seen.contains_key(&fingerprint) {
                        rejected += 1;
                        continue;
                    }
                    seen.insert(fingerprint, next.len());
                    next.push(Individual::from_permutation(self.ctx, permutation));
                }
            }
            next.truncate(config.population_size);

            let split = elites.min(next.len());
            pool.install(|| {
                next[split..].par_iter_mut().for_each(|individual| {
                    builder.evaluate(individual);
                });
            });
            sort_ascending(&mut next);
            population = next;

            fitness_history.push(population[0].fitness);
            debug!(generation, best = population[0].fitness, "generation complete");

            let sum = top3_sum(&population);
            if (sum - top3).abs() < 1e-9 {
                stagnation_counter += 1;
            } else {
                stagnation_counter = 0;
                top3 = sum;
            }
            if stagnation_counter >= STAGNATION_GENERATIONS {
                knobs.randomize(&mut rng);
                stagnation_counter = 0;
                stagnation_resets += 1;
                debug!(generation, "top-3 fitness stagnated; re-rolled operator knobs");
            }
        }

        let feasible = population[0].fitness < config.deadend;
        if !feasible {
            warn!(
                best = population[0].fitness,
                "no feasible schedule found; best partial assignment returned"
            );
        }
        info!(
            best = population[0].fitness,
            feasible,
            stagnation_resets,
            "evolutionary schedule search finished"
        );

        EvolutionResult {
            population,
            generations: config.generations_limit,
            fitness_history,
            stagnation_resets,
            feasible,
        }
    }

    /// Appends `count` random individuals, redrawing on fingerprint
    /// collisions a bounded number of times per slot before accepting a
    /// duplicate.
    fn fill_with_randoms<R: Rng>(
        &self,
        target: &mut Vec<Individual>,
        seen: &mut HashMap<u64, usize>,
        count: usize,
        rng: &mut R,
    ) {
        for _ in 0..count {
            let mut candidate = Individual::random(self.ctx, rng);
            let mut fingerprint = candidate.fingerprint();
            let mut attempts = 0;
            while seen.contains_key(&fingerprint) && attempts < RANDOM_REDRAW_ATTEMPTS {
                candidate = Individual::random(self.ctx, rng);
                fingerprint = candidate.fingerprint();
                attempts += 1;
            }
            seen.insert(fingerprint, target.len());
            target.push(candidate);
        }
    }
}

fn sort_ascending(population: &mut [Individual]) {
    population.sort_by(|a, b| {
        a.fitness
            .partial_cmp(&b.fitness)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn top3_sum(population: &[Individual]) -> f64 {
    population
        .iter()
        .take(3)
        .map(|individual| individual.fitness)
        .sum()
}
