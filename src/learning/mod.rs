//! Feature weight calibration via a genetic search.
//!
//! The defect probability weighs revisions, fixes, and authors; this module
//! finds the weights that best separate components touched by bug-fixing
//! commits from components that were not. A candidate triple is encoded as a
//! fixed-point bit vector (`bits` per weight), decoded by normalizing each
//! integer by `2^bits - 1`, and scored by replaying the whole commit stream
//! under the candidate weights.

use std::collections::HashSet;

use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::analytics::risk::defect_probability;
use crate::analytics::{FoldContext, RepositoryAnalytics};
use crate::core::repository::Repository;
use crate::core::types::{FeatureWeights, Identity};

pub const DEFAULT_BITS: u32 = 3;
pub const DEFAULT_GENERATIONS: u32 = 40;

const FEATURES: usize = 3;
const CROSSOVER_PROB: f64 = 0.5;
const MUTATION_PROB: f64 = 0.1;
const BIT_FLIP_PROB: f64 = 0.05;
const TOURNAMENT_SIZE: usize = 3;

type Genome = Vec<bool>;

/// The calibration result: the learned triple plus the parameters used
#[derive(Debug, Clone, Serialize)]
pub struct LearnedWeights {
    pub weights: FeatureWeights,
    pub fitness: f64,
    pub bits: u32,
    pub generations: u32,
}

pub struct FeatureWeightLearner<'a> {
    repository: &'a Repository,
    ctx: FoldContext,
    bits: u32,
    generations: u32,
    population_size: usize,
}

impl<'a> FeatureWeightLearner<'a> {
    pub fn new(repository: &'a Repository, ctx: FoldContext) -> Self {
        let mut learner = Self {
            repository,
            ctx,
            bits: DEFAULT_BITS,
            generations: DEFAULT_GENERATIONS,
            population_size: 0,
        };
        learner.population_size = learner.default_population();
        learner
    }

    pub fn with_bits(mut self, bits: Option<u32>) -> Self {
        if let Some(bits) = bits {
            self.bits = bits;
            self.population_size = self.default_population();
        }
        self
    }

    pub fn with_generations(mut self, generations: Option<u32>) -> Self {
        if let Some(generations) = generations {
            self.generations = generations;
        }
        self
    }

    fn default_population(&self) -> usize {
        (1.5 * f64::from(2u32.pow(FEATURES as u32 * self.bits))).round() as usize
    }

    /// Whether the history carries no bug-fixing commit at all, making every
    /// candidate's fitness identical
    pub fn is_degenerate(&self) -> bool {
        !self
            .repository
            .commits
            .iter()
            .any(|c| c.is_bug_fixing(&self.ctx.fix_pattern))
    }

    /// Run the generational search and return the best triple found.
    ///
    /// With a degenerate history the fitness landscape is flat and the
    /// returned triple is an arbitrary valid one; this is reported via a
    /// warning, never papered over.
    pub fn learn(&self) -> LearnedWeights {
        if self.is_degenerate() {
            log::warn!("history has no bug-fixing commits; learned weights are arbitrary");
        }
        let genome_len = FEATURES * self.bits as usize;
        let mut rng = rand::rng();

        let mut population: Vec<Genome> = (0..self.population_size)
            .map(|_| (0..genome_len).map(|_| rng.random_bool(0.5)).collect())
            .collect();

        for generation in 0..self.generations {
            let offspring = self.vary(&population, &mut rng);
            let fitnesses = self.evaluate_all(&offspring);
            if let Some(best) = fitnesses.iter().copied().reduce(f64::max) {
                log::debug!("generation {generation}: best fitness {best:.6}");
            }
            population = self.tournament_select(&offspring, &fitnesses, population.len(), &mut rng);
        }

        let fitnesses = self.evaluate_all(&population);
        let best_index = fitnesses
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let mut weights = self.decode(&population[best_index]);
        let mut fitness = fitnesses[best_index];
        if !weights.is_valid() {
            // Every candidate was rejected by the constraints; fall back to
            // the default triple rather than returning a meaningless one
            log::warn!("search found no valid weight triple; falling back to defaults");
            weights = FeatureWeights::default();
            fitness = self.fitness(&weights);
        }
        LearnedWeights {
            weights,
            fitness,
            bits: self.bits,
            generations: self.generations,
        }
    }

    /// Crossover and mutation over a cloned population
    fn vary(&self, population: &[Genome], rng: &mut impl Rng) -> Vec<Genome> {
        let mut offspring: Vec<Genome> = population.to_vec();
        for i in (1..offspring.len()).step_by(2) {
            if rng.random_bool(CROSSOVER_PROB) {
                let (left, right) = offspring.split_at_mut(i);
                two_point_crossover(&mut left[i - 1], &mut right[0], rng);
            }
        }
        for genome in &mut offspring {
            if rng.random_bool(MUTATION_PROB) {
                for bit in genome.iter_mut() {
                    if rng.random_bool(BIT_FLIP_PROB) {
                        *bit = !*bit;
                    }
                }
            }
        }
        offspring
    }

    /// Fitness of every genome; candidates are independent, so they are
    /// evaluated in parallel
    fn evaluate_all(&self, population: &[Genome]) -> Vec<f64> {
        population
            .par_iter()
            .map(|genome| self.fitness(&self.decode(genome)))
            .collect()
    }

    fn tournament_select(
        &self,
        pool: &[Genome],
        fitnesses: &[f64],
        count: usize,
        rng: &mut impl Rng,
    ) -> Vec<Genome> {
        (0..count)
            .map(|_| {
                let mut best = rng.random_range(0..pool.len());
                for _ in 1..TOURNAMENT_SIZE {
                    let challenger = rng.random_range(0..pool.len());
                    if fitnesses[challenger] > fitnesses[best] {
                        best = challenger;
                    }
                }
                pool[best].clone()
            })
            .collect()
    }

    fn decode(&self, genome: &Genome) -> FeatureWeights {
        let max_encoded = (1u64 << self.bits) - 1;
        let mut values = [0f64; FEATURES];
        for (i, chunk) in genome.chunks(self.bits as usize).enumerate().take(FEATURES) {
            let mut encoded = 0u64;
            for bit in chunk {
                encoded = (encoded << 1) | u64::from(*bit);
            }
            values[i] = encoded as f64 / max_encoded as f64;
        }
        FeatureWeights::new(values[0], values[1], values[2])
    }

    /// Total separation, across all bug-fixing commits, between the mean
    /// defect probability of the components the commit touched and the mean
    /// over the components seen before but not touched
    fn fitness(&self, weights: &FeatureWeights) -> f64 {
        if !weights.is_valid() {
            return f64::NEG_INFINITY;
        }
        let mut analytics = RepositoryAnalytics::new();
        let mut seen: HashSet<Identity> = HashSet::new();
        let mut separation = 0.0;

        for commit in &self.repository.commits {
            let outcome = analytics.apply(&self.ctx, commit);
            for retired in &outcome.retired {
                seen.remove(retired);
            }
            seen.extend(outcome.touched.iter().cloned());

            if commit.is_bug_fixing(&self.ctx.fix_pattern) {
                let involved: HashSet<&Identity> = outcome.touched.iter().collect();
                let involved_mean =
                    self.mean_probability(&analytics, involved.iter().copied(), weights);
                let not_involved_mean = self.mean_probability(
                    &analytics,
                    seen.iter().filter(|id| !involved.contains(*id)),
                    weights,
                );
                separation += involved_mean - not_involved_mean;
            }
        }
        separation
    }

    /// Mean defect probability over the components' last bug snapshots;
    /// components never snapshotted are excluded
    fn mean_probability<'i>(
        &self,
        analytics: &RepositoryAnalytics,
        identities: impl Iterator<Item = &'i Identity>,
        weights: &FeatureWeights,
    ) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for identity in identities {
            if let Some(node) = analytics.find(identity) {
                if let Some((revisions, fixes, authors)) = node.metrics.last_snapshot {
                    sum += defect_probability(revisions, fixes, authors, weights);
                    count += 1;
                }
            }
        }
        if count > 0 {
            sum / count as f64
        } else {
            0.0
        }
    }
}
