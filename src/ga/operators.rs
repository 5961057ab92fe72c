//! Genetic operators over task permutations.
//!
//! All operators act on the genotype alone — a `Vec<String>` of task ids —
//! and preserve permutation validity: every task id appears exactly once in
//! every output.
//!
//! - **Tournament selection** draws a shuffled sample of the population,
//!   keeps the fittest, and removes it from the pool so parents are distinct.
//! - **Order-1 crossover** copies a contiguous slice from each parent and
//!   fills the rest in order from the next parent (ring-wise for more than
//!   two parents).
//! - **Swap mutation** exchanges pairs of positions drawn from a random
//!   index order; **displacement mutation** removes a task and reinserts it
//!   further right.
//!
//! The operator bounds live in [`OperatorKnobs`], which the engine
//! re-randomises when the search stagnates.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SchedulerConfig;
use super::Individual;

/// Mutable copy of the operator parameters.
///
/// Starts from the configuration; [`randomize`](Self::randomize) re-rolls
/// every knob when the engine detects stagnation.
#[derive(Debug, Clone)]
pub struct OperatorKnobs {
    /// Individuals drawn per tournament round.
    pub tourney_sample_size: usize,
    /// Parents per crossover.
    pub crossover_parents_number: usize,
    /// Upper bound on the OX1 slice length.
    pub max_crossover_length: usize,
    /// Upper bound on genes touched by one mutation.
    pub max_mutated_genes: usize,
    /// Probability that mutation displaces instead of swapping.
    pub mutation_type_preference: f64,
}

impl OperatorKnobs {
    /// Copies the initial knob values from the configuration.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            tourney_sample_size: config.tourney_sample_size,
            crossover_parents_number: config.crossover_parents_number,
            max_crossover_length: config.max_crossover_length,
            max_mutated_genes: config.max_mutated_genes,
            mutation_type_preference: config.mutation_type_preference,
        }
    }

    /// Re-rolls every knob, the stagnation escape hatch.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        self.tourney_sample_size = rng.random_range(10..=100);
        self.crossover_parents_number = rng.random_range(2..=4);
        self.max_crossover_length = rng.random_range(10..=100);
        self.max_mutated_genes = rng.random_range(10..=100);
        self.mutation_type_preference = rng.random_range(0.0..1.0);
    }
}

/// Selects `parents` distinct individuals by tournament.
///
/// Each round shuffles the remaining index pool, samples the first
/// `sample_size` entries, keeps the index with the lowest fitness, and
/// swap-removes it from the pool. Returns fewer indices only when the
/// population is smaller than `parents`.
pub fn tournament_select<R: Rng>(
    population: &[Individual],
    parents: usize,
    sample_size: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..population.len()).collect();
    let mut picked = Vec::with_capacity(parents);

    for _ in 0..parents {
        if pool.is_empty() {
            break;
        }
        pool.shuffle(rng);
        let sample = sample_size.max(1).min(pool.len());
        let mut best = 0;
        for candidate in 1..sample {
            if population[pool[candidate]].fitness < population[pool[best]].fitness {
                best = candidate;
            }
        }
        picked.push(pool[best]);
        pool.swap_remove(best);
    }

    picked
}

/// Order-1 crossover over `parents.len()` permutations.
///
/// Child `i` copies parent `i`'s slice `[cs, ce)` verbatim and fills the
/// remaining positions left to right from parent `(i + 1) % k`, skipping
/// ids already in the slice. A zero-length slice returns the parents
/// unchanged.
pub fn order_crossover<R: Rng>(
    parents: &[Vec<String>],
    max_crossover_length: usize,
    rng: &mut R,
) -> Vec<Vec<String>> {
    let Some(first) = parents.first() else {
        return Vec::new();
    };
    let n = first.len();
    if n == 0 {
        return parents.to_vec();
    }

    let cs = rng.random_range(0..n);
    let length = if max_crossover_length > 0 {
        rng.random_range(0..max_crossover_length)
    } else {
        0
    };
    let ce = (cs + length).min(n);
    if ce == cs {
        return parents.to_vec();
    }

    (0..parents.len())
        .map(|i| {
            let donor = &parents[(i + 1) % parents.len()];
            ox1_child(&parents[i], donor, cs, ce)
        })
        .collect()
}

fn ox1_child(template: &[String], donor: &[String], cs: usize, ce: usize) -> Vec<String> {
    let copied: HashSet<&str> = template[cs..ce].iter().map(String::as_str).collect();
    let mut from_donor = donor.iter().filter(|id| !copied.contains(id.as_str()));

    (0..template.len())
        .map(|pos| {
            if pos >= cs && pos < ce {
                template[pos].clone()
            } else {
                from_donor
                    .next()
                    .cloned()
                    .unwrap_or_else(|| template[pos].clone())
            }
        })
        .collect()
}

/// Mutates a permutation in place, choosing displacement with probability
/// `mutation_type_preference` and swap otherwise.
pub fn mutate<R: Rng>(permutation: &mut Vec<String>, knobs: &OperatorKnobs, rng: &mut R) {
    if rng.random_bool(knobs.mutation_type_preference.clamp(0.0, 1.0)) {
        displacement_mutation(permutation, knobs.max_mutated_genes, rng);
    } else {
        swap_mutation(permutation, knobs.max_mutated_genes, rng);
    }
}

/// Swap mutation: draws a random index order and swaps `order[i]` with
/// `order[n-1-i]` for the first `numGenes ∈ [1, max_mutated_genes]` pairs.
pub fn swap_mutation<R: Rng>(
    permutation: &mut [String],
    max_mutated_genes: usize,
    rng: &mut R,
) {
    let n = permutation.len();
    if n < 2 {
        return;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let genes = rng.random_range(1..=max_mutated_genes.max(1)).min(n);
    swap_with_order(permutation, &order, genes);
}

/// The deterministic body of [`swap_mutation`]; applying it twice with the
/// same order and gene count restores the permutation when the swapped
/// pairs are disjoint.
pub(crate) fn swap_with_order(permutation: &mut [String], order: &[usize], genes: usize) {
    let n = permutation.len();
    for i in 0..genes.min(n) {
        permutation.swap(order[i], order[n - 1 - i]);
    }
}

/// Displacement mutation: `numGenes ∈ [1, max_mutated_genes]` rounds of
/// removing a task and reinserting it at a later position, shifting the
/// tasks in between one slot left.
pub fn displacement_mutation<R: Rng>(
    permutation: &mut Vec<String>,
    max_mutated_genes: usize,
    rng: &mut R,
) {
    let n = permutation.len();
    if n < 2 {
        return;
    }
    let genes = rng.random_range(1..=max_mutated_genes.max(1));
    for _ in 0..genes {
        let old_pos = rng.random_range(0..n - 1);
        let new_pos = rng.random_range(old_pos + 1..n);
        let task = permutation.remove(old_pos);
        permutation.insert(new_pos, task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, ProjectFamiliarity, Site, SchedulingContext, Task, Worker};
    use chrono::NaiveDateTime;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn perm(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn assert_same_elements(a: &[String], b: &[String]) {
        let mut a_sorted = a.to_vec();
        let mut b_sorted = b.to_vec();
        a_sorted.sort();
        b_sorted.sort();
        assert_eq!(a_sorted, b_sorted);
    }

    fn population(fitnesses: &[f64]) -> Vec<Individual> {
        let site = Site::working_hours(8, 16);
        let ctx = SchedulingContext::new(
            vec![Project::new("P1", site)],
            vec![Task::new("P1", "T1").with_valid_worker("W1")],
            vec![Worker::new("W1")],
            ProjectFamiliarity::new(),
            NaiveDateTime::parse_from_str("2020-12-21T08:00", "%Y-%m-%dT%H:%M").unwrap(),
        );
        fitnesses
            .iter()
            .map(|&f| {
                let mut ind = Individual::from_permutation(&ctx, ctx.task_ids());
                ind.fitness = f;
                ind
            })
            .collect()
    }

    #[test]
    fn test_tournament_returns_distinct_parents() {
        let pop = population(&[5.0, 3.0, 8.0, 1.0, 9.0]);
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..50 {
            let picked = tournament_select(&pop, 3, 2, &mut rng);
            assert_eq!(picked.len(), 3);
            let unique: std::collections::HashSet<usize> = picked.iter().copied().collect();
            assert_eq!(unique.len(), 3, "parents must be distinct: {picked:?}");
        }
    }

    #[test]
    fn test_tournament_full_sample_picks_best() {
        let pop = population(&[5.0, 3.0, 8.0, 1.0, 9.0]);
        let mut rng = SmallRng::seed_from_u64(42);

        // Sampling the whole pool makes the first pick deterministic.
        let picked = tournament_select(&pop, 2, 5, &mut rng);
        assert_eq!(picked[0], 3); // fitness 1.0
        assert_eq!(picked[1], 1); // next best after removal
    }

    #[test]
    fn test_tournament_caps_at_population_size() {
        let pop = population(&[2.0, 1.0]);
        let mut rng = SmallRng::seed_from_u64(42);
        let picked = tournament_select(&pop, 5, 3, &mut rng);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn test_ox1_children_are_permutations() {
        let p1 = perm(&["a", "b", "c", "d", "e", "f"]);
        let p2 = perm(&["f", "e", "d", "c", "b", "a"]);
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..100 {
            let children = order_crossover(&[p1.clone(), p2.clone()], 4, &mut rng);
            assert_eq!(children.len(), 2);
            for child in &children {
                assert_same_elements(child, &p1);
            }
        }
    }

    #[test]
    fn test_ox1_three_parent_ring() {
        let p1 = perm(&["a", "b", "c", "d"]);
        let p2 = perm(&["d", "c", "b", "a"]);
        let p3 = perm(&["b", "a", "d", "c"]);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..50 {
            let children =
                order_crossover(&[p1.clone(), p2.clone(), p3.clone()], 3, &mut rng);
            assert_eq!(children.len(), 3);
            for child in &children {
                assert_same_elements(child, &p1);
            }
        }
    }

    #[test]
    fn test_ox1_zero_length_is_identity() {
        let p1 = perm(&["a", "b", "c", "d"]);
        let p2 = perm(&["d", "c", "b", "a"]);
        let mut rng = SmallRng::seed_from_u64(42);

        // max length 1 forces a zero-length slice.
        let children = order_crossover(&[p1.clone(), p2.clone()], 1, &mut rng);
        assert_eq!(children[0], p1);
        assert_eq!(children[1], p2);
    }

    #[test]
    fn test_ox1_slice_preserved_from_template() {
        let p1 = perm(&["a", "b", "c", "d", "e"]);
        let p2 = perm(&["e", "d", "c", "b", "a"]);
        let children = [ox1_child(&p1, &p2, 1, 3), ox1_child(&p2, &p1, 1, 3)];

        // Child 0 keeps b,c at positions 1..3 and fills e,d,a around them.
        assert_eq!(children[0], perm(&["e", "b", "c", "d", "a"]));
        // Child 1 keeps d,c and fills a,b,e around them.
        assert_eq!(children[1], perm(&["a", "d", "c", "b", "e"]));
    }

    #[test]
    fn test_swap_mutation_preserves_elements() {
        let original = perm(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..100 {
            let mut mutated = original.clone();
            swap_mutation(&mut mutated, 3, &mut rng);
            assert_same_elements(&mutated, &original);
        }
    }

    #[test]
    fn test_swap_twice_with_same_order_is_identity() {
        let original = perm(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let order = vec![3, 0, 6, 2, 5, 1, 7, 4];

        // Disjoint pairs (genes <= n/2): applying twice restores the input.
        for genes in 1..=4 {
            let mut mutated = original.clone();
            swap_with_order(&mut mutated, &order, genes);
            swap_with_order(&mut mutated, &order, genes);
            assert_eq!(mutated, original, "genes = {genes}");
        }
    }

    #[test]
    fn test_displacement_mutation_preserves_elements() {
        let original = perm(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..100 {
            let mut mutated = original.clone();
            displacement_mutation(&mut mutated, 3, &mut rng);
            assert_same_elements(&mutated, &original);
        }
    }

    #[test]
    fn test_displacement_moves_right() {
        // With n = 2 the only displacement is swapping the two positions.
        let mut p = perm(&["a", "b"]);
        let mut rng = SmallRng::seed_from_u64(42);
        displacement_mutation(&mut p, 1, &mut rng);
        assert_eq!(p, perm(&["b", "a"]));
    }

    #[test]
    fn test_mutate_dispatches_both_types() {
        let original = perm(&["a", "b", "c", "d", "e"]);
        let mut rng = SmallRng::seed_from_u64(42);

        for preference in [0.0, 0.5, 1.0] {
            let knobs = OperatorKnobs {
                tourney_sample_size: 2,
                crossover_parents_number: 2,
                max_crossover_length: 3,
                max_mutated_genes: 2,
                mutation_type_preference: preference,
            };
            let mut mutated = original.clone();
            mutate(&mut mutated, &knobs, &mut rng);
            assert_same_elements(&mutated, &original);
        }
    }

    #[test]
    fn test_knobs_randomize_within_ranges() {
        let mut knobs = OperatorKnobs::from_config(&SchedulerConfig::default());
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..100 {
            knobs.randomize(&mut rng);
            assert!((10..=100).contains(&knobs.tourney_sample_size));
            assert!((2..=4).contains(&knobs.crossover_parents_number));
            assert!((10..=100).contains(&knobs.max_crossover_length));
            assert!((10..=100).contains(&knobs.max_mutated_genes));
            assert!((0.0..=1.0).contains(&knobs.mutation_type_preference));
        }
    }
}
