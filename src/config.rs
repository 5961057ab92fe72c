//! Scheduler configuration.
//!
//! [`SchedulerConfig`] gathers every tunable of the evolutionary search and
//! of worker scoring: population sizing, operator rates and bounds, the AHP
//! criteria weights, pinning tolerance, evaluation parallelism, and the
//! travel-model constants.
//!
//! Field names deserialize from the camelCase keys the loader's config block
//! uses (`populationSize`, `weightDistance`, ...).

use serde::{Deserialize, Serialize};

use crate::geo::{DEFAULT_DRIVING_SPEED_KMH, DEFAULT_EARTH_RADIUS_KM};
use crate::models::calendar::DEFAULT_ROUNDING_SECS;

/// All knobs of a scheduling run.
///
/// # Builder Pattern
///
/// ```
/// use crew_scheduler::SchedulerConfig;
///
/// let config = SchedulerConfig::default()
///     .with_population_size(200)
///     .with_generations_limit(300)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// Number of individuals in the population.
    pub population_size: usize,
    /// Number of generations to evolve.
    pub generations_limit: usize,
    /// Probability of recombining selected parents (0.0–1.0).
    pub crossover_rate: f64,
    /// Probability of mutating an offspring (0.0–1.0).
    pub mutation_rate: f64,
    /// Fraction of the population carried over unchanged each generation.
    pub elitism_rate: f64,
    /// Fitness penalty per unschedulable task. Any feasible individual must
    /// beat any infeasible one, so this dwarfs realistic makespans.
    pub deadend: f64,
    /// Individuals drawn per tournament round.
    pub tourney_sample_size: usize,
    /// Parents fed into one crossover (2 for classic OX1, more for ring-wise).
    pub crossover_parents_number: usize,
    /// Upper bound on the copied slice length in order crossover.
    pub max_crossover_length: usize,
    /// Upper bound on genes touched by one mutation.
    pub max_mutated_genes: usize,
    /// Probability that mutation displaces instead of swapping (0.0–1.0).
    pub mutation_type_preference: f64,
    /// AHP weight of the driving-time criterion.
    pub weight_distance: f64,
    /// AHP weight of the accumulated-delay criterion.
    pub weight_delay: f64,
    /// AHP weight of the project-familiarity criterion.
    pub weight_project_familiarity: f64,
    /// AHP weight of the inverse-demand criterion.
    pub weight_demand: f64,
    /// Driving sub-score awarded to a co-located worker.
    pub max_value_driving: f64,
    /// Delay sub-score awarded to a worker idle since schedule start.
    pub max_value_delay: f64,
    /// Reserved ceiling for the demand sub-score.
    pub max_value_demand: f64,
    /// Width in working hours of the forward window that lets a candidate
    /// start snap onto a pinned datetime.
    #[serde(rename = "pinnedDateTimeSnap")]
    pub pinned_datetime_snap: f64,
    /// Size of the fitness-evaluation thread pool.
    pub threads_num: usize,
    /// Average driving speed between sites (km/h).
    pub driving_speed_kmh: f64,
    /// Earth radius used by the distance estimate (km).
    pub earth_radius_km: f64,
    /// Granularity work end times are rounded up to (seconds).
    pub time_rounding_seconds: u32,
    /// Random seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations_limit: 500,
            crossover_rate: 0.9,
            mutation_rate: 0.25,
            elitism_rate: 0.05,
            deadend: 10_000.0,
            tourney_sample_size: 10,
            crossover_parents_number: 2,
            max_crossover_length: 30,
            max_mutated_genes: 10,
            mutation_type_preference: 0.5,
            weight_distance: 1.0,
            weight_delay: 1.0,
            weight_project_familiarity: 0.01,
            weight_demand: 1.0,
            max_value_driving: 100.0,
            max_value_delay: 100.0,
            max_value_demand: 1.0,
            pinned_datetime_snap: 8.0,
            threads_num: 256,
            driving_speed_kmh: DEFAULT_DRIVING_SPEED_KMH,
            earth_radius_km: DEFAULT_EARTH_RADIUS_KM,
            time_rounding_seconds: DEFAULT_ROUNDING_SECS,
            seed: None,
        }
    }
}

impl SchedulerConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation count.
    pub fn with_generations_limit(mut self, n: usize) -> Self {
        self.generations_limit = n;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elitism rate.
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the AHP criteria weights.
    pub fn with_weights(mut self, distance: f64, delay: f64, familiarity: f64, demand: f64) -> Self {
        self.weight_distance = distance;
        self.weight_delay = delay;
        self.weight_project_familiarity = familiarity;
        self.weight_demand = demand;
        self
    }

    /// Sets the pinned-datetime snap window in working hours.
    pub fn with_pinned_datetime_snap(mut self, hours: f64) -> Self {
        self.pinned_datetime_snap = hours;
        self
    }

    /// Sets the evaluation thread count.
    pub fn with_threads_num(mut self, n: usize) -> Self {
        self.threads_num = n;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is out of range.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("populationSize must be at least 2".into());
        }
        if self.generations_limit == 0 {
            return Err("generationsLimit must be at least 1".into());
        }
        let elites = (self.elitism_rate * self.population_size as f64) as usize;
        if elites >= self.population_size {
            return Err("elitismRate too high: elites fill the entire population".into());
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err("crossoverRate must lie in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err("mutationRate must lie in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.mutation_type_preference) {
            return Err("mutationTypePreference must lie in [0, 1]".into());
        }
        if self.tourney_sample_size == 0 {
            return Err("tourneySampleSize must be at least 1".into());
        }
        if self.crossover_parents_number < 2 {
            return Err("crossoverParentsNumber must be at least 2".into());
        }
        if self.max_crossover_length == 0 {
            return Err("maxCrossoverLength must be at least 1".into());
        }
        if self.max_mutated_genes == 0 {
            return Err("maxMutatedGenes must be at least 1".into());
        }
        if self.deadend <= 0.0 {
            return Err("deadend must be positive".into());
        }
        if self.pinned_datetime_snap < 0.0 {
            return Err("pinnedDateTimeSnap must be non-negative".into());
        }
        if self.threads_num == 0 {
            return Err("threadsNum must be at least 1".into());
        }
        if self.driving_speed_kmh <= 0.0 {
            return Err("drivingSpeedKmh must be positive".into());
        }
        if self.earth_radius_km <= 0.0 {
            return Err("earthRadiusKm must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::default()
            .with_population_size(50)
            .with_generations_limit(20)
            .with_crossover_rate(0.8)
            .with_mutation_rate(0.1)
            .with_elitism_rate(0.1)
            .with_weights(2.0, 1.0, 0.5, 0.0)
            .with_pinned_datetime_snap(4.0)
            .with_threads_num(8)
            .with_seed(42);

        assert_eq!(config.population_size, 50);
        assert_eq!(config.generations_limit, 20);
        assert_eq!(config.weight_distance, 2.0);
        assert_eq!(config.weight_demand, 0.0);
        assert_eq!(config.pinned_datetime_snap, 4.0);
        assert_eq!(config.threads_num, 8);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_rates_are_clamped() {
        let config = SchedulerConfig::default()
            .with_crossover_rate(1.8)
            .with_mutation_rate(-0.2);
        assert_eq!(config.crossover_rate, 1.0);
        assert_eq!(config.mutation_rate, 0.0);
    }

    #[test]
    fn test_validate_rejects_tiny_population() {
        let config = SchedulerConfig::default().with_population_size(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_generations() {
        let config = SchedulerConfig::default().with_generations_limit(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_full_elitism() {
        let config = SchedulerConfig::default()
            .with_population_size(10)
            .with_elitism_rate(1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_camel_case_keys_deserialize() {
        let raw = r#"{
            "populationSize": 32,
            "generationsLimit": 10,
            "weightDistance": 3.5,
            "pinnedDateTimeSnap": 6.0,
            "threadsNum": 4
        }"#;
        let config: SchedulerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.population_size, 32);
        assert_eq!(config.generations_limit, 10);
        assert_eq!(config.weight_distance, 3.5);
        assert_eq!(config.pinned_datetime_snap, 6.0);
        assert_eq!(config.threads_num, 4);
        // Unspecified keys keep their defaults.
        assert_eq!(config.mutation_rate, 0.25);
    }
}
