use crate::config::PlannerConfig;
use crate::evaluator::{ConstraintEvaluator, ScoreResult};
use crate::pool::InstrumentPool;
use crate::schema::{Instrument, InstrumentId, Target};
use chrono::NaiveDate;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A feasible selection found during the search, with the round that produced it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub instruments: Vec<Instrument>,
    pub score: ScoreResult,
    pub round: usize,
    sorted_ids: Vec<InstrumentId>,
}

impl Candidate {
    fn new(instruments: Vec<Instrument>, score: ScoreResult, round: usize) -> Self {
        let mut sorted_ids: Vec<InstrumentId> =
            instruments.iter().map(|i| i.id().clone()).collect();
        sorted_ids.sort();
        Self {
            instruments,
            score,
            round,
            sorted_ids,
        }
    }

    /// Ranking used to pick the best candidate: lower score, then fewer
    /// instruments, then the lexicographically smaller sorted id list.
    pub fn rank_cmp(&self, other: &Candidate) -> Ordering {
        self.score
            .score
            .total_cmp(&other.score.score)
            .then_with(|| self.instruments.len().cmp(&other.instruments.len()))
            .then_with(|| self.sorted_ids.cmp(&other.sorted_ids))
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub selection: Vec<Instrument>,
    pub feasible: bool,
    /// Score of the returned selection. `None` when nothing feasible was found.
    pub score: Option<ScoreResult>,
    pub rounds_run: usize,
}

impl OptimizationResult {
    fn from_best(best: Option<Candidate>, rounds_run: usize) -> Self {
        match best {
            Some(candidate) => Self {
                selection: candidate.instruments,
                feasible: true,
                score: Some(candidate.score),
                rounds_run,
            },
            None => Self {
                selection: Vec::new(),
                feasible: false,
                score: None,
                rounds_run,
            },
        }
    }
}

/// Anytime multi-start greedy search. Rounds can be added with further calls to
/// `run_rounds`; the best score never gets worse.
pub struct SelectionSearch<'a> {
    pool: &'a InstrumentPool,
    target: &'a Target,
    now: NaiveDate,
    evaluator: ConstraintEvaluator,
    ceiling: Decimal,
    best: Option<Candidate>,
    rounds_run: usize,
}

impl<'a> SelectionSearch<'a> {
    pub fn new(
        pool: &'a InstrumentPool,
        target: &'a Target,
        now: NaiveDate,
        evaluator: ConstraintEvaluator,
    ) -> Self {
        let ceiling = evaluator.tolerances().amount_ceiling(target.amount());
        Self {
            pool,
            target,
            now,
            evaluator,
            ceiling,
            best: None,
            rounds_run: 0,
        }
    }

    pub fn run_rounds<R: Rng + ?Sized>(&mut self, rng: &mut R, rounds: usize) -> usize {
        self.run_until(rng, rounds, || false)
    }

    /// Runs up to `rounds` rounds, checking `should_stop` before each one.
    /// Returns the number of rounds actually run.
    pub fn run_until<R, F>(&mut self, rng: &mut R, rounds: usize, should_stop: F) -> usize
    where
        R: Rng + ?Sized,
        F: Fn() -> bool,
    {
        if self.pool.is_empty() {
            return 0;
        }

        let mut completed = 0;
        for _ in 0..rounds {
            if should_stop() {
                debug!("Search stopped after {} rounds", completed);
                break;
            }
            self.run_round(rng);
            completed += 1;
        }
        completed
    }

    fn run_round<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let round = self.rounds_run;
        self.rounds_run += 1;

        let candidate = self.build_candidate(rng);
        let score = self
            .evaluator
            .evaluate(candidate.iter().copied(), self.target, self.now);
        if !score.feasible {
            return;
        }

        if let Some(best) = &self.best {
            if score.score > best.score.score {
                return;
            }
        }

        let candidate = Candidate::new(candidate.into_iter().cloned().collect(), score, round);
        let improves = match &self.best {
            Some(best) => candidate.rank_cmp(best) == Ordering::Less,
            None => true,
        };

        if improves {
            debug!(
                "Round {}: new best score {:.4} with {} instruments",
                round,
                candidate.score.score,
                candidate.instruments.len()
            );
            self.best = Some(candidate);
        }
    }

    /// Shuffles the pool and greedily takes every note that keeps the running
    /// total within the overshoot ceiling.
    fn build_candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&'a Instrument> {
        let pool: &'a InstrumentPool = self.pool;
        let mut order: Vec<&'a Instrument> = pool.all().iter().collect();
        order.shuffle(rng);

        let mut running = Decimal::ZERO;
        order
            .into_iter()
            .filter(|instrument| {
                if running + instrument.amount() <= self.ceiling {
                    running += instrument.amount();
                    true
                } else {
                    false
                }
            })
            .collect()
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().map(|c| c.score.score)
    }

    pub fn rounds_run(&self) -> usize {
        self.rounds_run
    }

    pub fn into_result(self) -> OptimizationResult {
        OptimizationResult::from_best(self.best, self.rounds_run)
    }
}

pub struct SelectionOptimizer {
    config: PlannerConfig,
    evaluator: ConstraintEvaluator,
}

impl SelectionOptimizer {
    pub fn new(config: PlannerConfig) -> Self {
        let evaluator = ConstraintEvaluator::new(config.tolerances.clone());
        Self { config, evaluator }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn optimize<R: Rng + ?Sized>(
        &self,
        pool: &InstrumentPool,
        target: &Target,
        now: NaiveDate,
        iterations: usize,
        rng: &mut R,
    ) -> OptimizationResult {
        self.optimize_until(pool, target, now, iterations, rng, || false)
    }

    pub fn optimize_until<R, F>(
        &self,
        pool: &InstrumentPool,
        target: &Target,
        now: NaiveDate,
        iterations: usize,
        rng: &mut R,
        should_stop: F,
    ) -> OptimizationResult
    where
        R: Rng + ?Sized,
        F: Fn() -> bool,
    {
        let mut search = SelectionSearch::new(pool, target, now, self.evaluator.clone());
        search.run_until(rng, iterations, should_stop);
        let result = search.into_result();
        log_outcome(pool, target, &result);
        result
    }

    /// Runs with the configured iteration budget, worker count and seed. Without
    /// a seed the search is seeded from system entropy.
    pub fn run(&self, pool: &InstrumentPool, target: &Target, now: NaiveDate) -> OptimizationResult {
        self.run_until(pool, target, now, || false)
    }

    pub fn run_until<F>(
        &self,
        pool: &InstrumentPool,
        target: &Target,
        now: NaiveDate,
        should_stop: F,
    ) -> OptimizationResult
    where
        F: Fn() -> bool + Sync,
    {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        debug!(
            "Optimizing over {} instruments with {} iterations on {} workers (seed {})",
            pool.len(),
            self.config.iterations,
            self.config.workers,
            seed
        );

        if self.config.workers <= 1 {
            let mut rng = StdRng::seed_from_u64(seed);
            self.optimize_until(pool, target, now, self.config.iterations, &mut rng, should_stop)
        } else {
            self.optimize_parallel_until(pool, target, now, seed, should_stop)
        }
    }

    /// Splits `config.iterations` across `config.workers` rayon workers, each
    /// with its own RNG stream derived from `seed`.
    pub fn optimize_parallel(
        &self,
        pool: &InstrumentPool,
        target: &Target,
        now: NaiveDate,
        seed: u64,
    ) -> OptimizationResult {
        self.optimize_parallel_until(pool, target, now, seed, || false)
    }

    pub fn optimize_parallel_until<F>(
        &self,
        pool: &InstrumentPool,
        target: &Target,
        now: NaiveDate,
        seed: u64,
        should_stop: F,
    ) -> OptimizationResult
    where
        F: Fn() -> bool + Sync,
    {
        let workers = self.config.workers.max(1);
        let iterations = self.config.iterations;

        let searches: Vec<SelectionSearch<'_>> = (0..workers)
            .into_par_iter()
            .map(|worker| {
                let mut rng = StdRng::seed_from_u64(derive_worker_seed(seed, worker));
                let mut search = SelectionSearch::new(pool, target, now, self.evaluator.clone());
                search.run_until(&mut rng, rounds_for_worker(iterations, workers, worker), &should_stop);
                search
            })
            .collect();

        let mut rounds_run = 0;
        let mut best: Option<Candidate> = None;

        // Worker order, then round order within a worker, breaks exact ties.
        for search in searches {
            rounds_run += search.rounds_run();
            if let Some(candidate) = search.best {
                let better = match &best {
                    Some(current) => candidate.rank_cmp(current) == Ordering::Less,
                    None => true,
                };
                if better {
                    best = Some(candidate);
                }
            }
        }

        let result = OptimizationResult::from_best(best, rounds_run);
        log_outcome(pool, target, &result);
        result
    }
}

fn log_outcome(pool: &InstrumentPool, target: &Target, result: &OptimizationResult) {
    match &result.score {
        Some(score) => info!(
            "Selected {} of {} instruments for target {} after {} rounds (score {:.4}, total {})",
            result.selection.len(),
            pool.len(),
            target.amount(),
            result.rounds_run,
            score.score,
            score.total_amount
        ),
        None => info!(
            "No feasible selection for target {} after {} rounds over {} instruments",
            target.amount(),
            result.rounds_run,
            pool.len()
        ),
    }
}

fn rounds_for_worker(iterations: usize, workers: usize, worker: usize) -> usize {
    let base = iterations / workers;
    let remainder = iterations % workers;
    if worker < remainder {
        base + 1
    } else {
        base
    }
}

/// SplitMix64 mix of the global seed and the worker index, giving each worker an
/// independent RNG stream.
pub fn derive_worker_seed(seed: u64, worker: usize) -> u64 {
    let mut z = seed.wrapping_add((worker as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
