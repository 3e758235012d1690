// -----------------------------------------------------------------------------
// Layout optimizer: multi-start annealing plus a validity-guarded refinement
// -----------------------------------------------------------------------------

use std::sync::Arc;

use parking_lot::Mutex;
use rand::prelude::*;
use rand_pcg::Pcg64Mcg as PcgRng;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::engine::annealer::{AnnealProfile, SimAnneal};
use crate::engine::config::{AnnealConfig, ConfigError};
use crate::engine::shape::Shape;
use crate::engine::solution::{Placement, Solution};
use crate::engine::stats::{AnnealStats, ProgressSink, ProgressUpdate, RunPhase};
use crate::engine::CancelToken;

/// Terminal result of `run()`. Cancellation is a first-class outcome, not an
/// error; the caller decides whether to restart.
#[derive(Clone, Debug)]
pub enum RunOutcome {
    Complete(Solution),
    Cancelled,
}

impl RunOutcome {
    pub fn solution(self) -> Option<Solution> {
        match self {
            RunOutcome::Complete(s) => Some(s),
            RunOutcome::Cancelled => None,
        }
    }
}

/// Drives many independent anneal runs to one refined, valid packing.
///
/// Each run owns its solutions outright; shapes are shared read-only through
/// `Arc`. The only cross-run merge point is the best-of reduction after the
/// multi-start join.
pub struct LayoutOptimizer {
    config: AnnealConfig,
    cancel: CancelToken,
    stats: Mutex<AnnealStats>,
}

impl LayoutOptimizer {
    pub fn new(config: AnnealConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
            stats: Mutex::new(AnnealStats::default()),
        })
    }

    /// Shared flag for asynchronous abortion of an in-flight `run()`.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn capture_stats_snapshot(&self) -> AnnealStats {
        self.stats.lock().clone()
    }

    /// Full search protocol: parallel multi-start, best-of reduction, then a
    /// refinement anneal repeated until the result passes `is_valid()`. The
    /// validity retry is unbounded; the cancel token is the escape hatch for
    /// shape sets that can never connect.
    pub fn run(
        &self,
        shapes: &[Arc<Shape>],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<RunOutcome, ConfigError> {
        if shapes.len() < 2 {
            return Err(ConfigError::NotEnoughShapes { got: shapes.len() });
        }

        // ---- Multi-start phase: independent seeded runs, join, pick best ----
        let results: Vec<Option<Solution>> = (0..self.config.num_starts)
            .into_par_iter()
            .map(|start| {
                if self.cancel.is_cancelled() {
                    return None;
                }
                let mut rng = PcgRng::seed_from_u64(
                    self.config
                        .seed
                        .wrapping_add(0x9e37_79b9_7f4a_7c15u64.wrapping_mul(start as u64 + 1)),
                );
                let initial = random_solution(shapes, self.config.overlap_penalty, &mut rng);
                self.anneal_run(
                    initial,
                    self.start_profile(start),
                    &mut rng,
                    RunPhase::MultiStart { start },
                    progress,
                )
            })
            .collect();

        if self.cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }
        // None entries only appear under cancellation, which was handled above.
        let Some(mut best) = results
            .into_iter()
            .flatten()
            .min_by(|a, b| a.score().total_cmp(&b.score()))
        else {
            return Ok(RunOutcome::Cancelled);
        };
        debug!(score = best.score(), "multi-start winner selected");

        // ---- Refinement phase: cooler, slower anneal; retry until valid ----
        let mut rng =
            PcgRng::seed_from_u64(self.config.seed.wrapping_add(0x7ef1_4e00_2026u64));
        let mut attempt: u64 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }
            attempt += 1;
            let refined = match self.anneal_run(
                best.clone(),
                self.refinement_profile(),
                &mut rng,
                RunPhase::Refinement { attempt },
                progress,
            ) {
                Some(s) => s,
                None => return Ok(RunOutcome::Cancelled),
            };
            if refined.score() < best.score() {
                best = refined.clone();
            }
            self.stats.lock().refinement_attempts = attempt;
            if refined.is_valid() {
                debug!(score = refined.score(), attempt, "refinement produced a valid packing");
                return Ok(RunOutcome::Complete(refined));
            }
            trace!(attempt, score = refined.score(), "refined solution invalid; retrying");
        }
    }

    /// One anneal run. Returns the best solution seen (not the last accepted
    /// one), or None if the cancel flag was observed mid-run.
    fn anneal_run(
        &self,
        initial: Solution,
        profile: AnnealProfile,
        rng: &mut PcgRng,
        phase: RunPhase,
        progress: Option<&dyn ProgressSink>,
    ) -> Option<Solution> {
        let mut sa = SimAnneal::new(profile);
        let mut current = initial;
        let mut best = current.clone();

        let mut proposals: u64 = 0;
        let mut accepts: u64 = 0;
        let mut uphill_attempts: u64 = 0;
        let mut uphill_accepts: u64 = 0;

        let mut iteration: u64 = 0;
        while !sa.finished() && iteration < self.config.max_iterations {
            if self.cancel.is_cancelled() {
                return None;
            }
            iteration += 1;

            let range = sa.movement_range(
                self.config.min_movement_range,
                self.config.max_movement_range,
            );
            let candidate = current.neighbor(range, rng);
            let delta = candidate.score() - current.score();
            let accepted = sa.should_accept(rng, delta);

            proposals += 1;
            if delta >= 0.0 {
                uphill_attempts += 1;
                if accepted {
                    uphill_accepts += 1;
                }
            }
            if accepted {
                accepts += 1;
                current = candidate;
            }

            if current.score() < best.score() {
                best = current.clone();
                sa.note_improvement();
            } else {
                sa.note_no_improvement();
            }
            sa.tick();

            if self.config.progress_interval > 0
                && iteration % self.config.progress_interval == 0
            {
                if let Some(sink) = progress {
                    sink.on_progress(ProgressUpdate {
                        phase,
                        iteration,
                        temperature: sa.temp(),
                        best_score: best.score(),
                        solution: best.clone(),
                    });
                }
            }
        }

        // Flush this run's counters into the shared aggregate once.
        {
            let mut stats = self.stats.lock();
            stats.total_proposals += proposals;
            stats.total_accepts += accepts;
            stats.total_uphill_attempts += uphill_attempts;
            stats.total_uphill_accepts += uphill_accepts;
            stats.total_reheats += sa.reheats();
            let is_new_best = stats.best_score.map_or(true, |b| best.score() < b);
            if is_new_best {
                stats.best_score = Some(best.score());
                stats.push_best_history(best.score());
            }
        }
        Some(best)
    }

    /// Later starts run cooler and cool faster, cheaply diversifying coverage.
    fn start_profile(&self, start: usize) -> AnnealProfile {
        let damp = 1.0 / (1.0 + 0.5 * start as f64);
        AnnealProfile {
            initial_temp: (self.config.initial_temp * damp).max(self.config.min_temp * 2.0),
            min_temp: self.config.min_temp,
            initial_cooling_rate: (self.config.initial_cooling_rate - 0.02 * start as f64)
                .max(0.5),
            cooling_increment: self.config.cooling_increment,
            reheating_boost: self.config.reheating_boost,
            reheat_counter: self.config.reheat_counter,
        }
    }

    /// Refinement exploits rather than explores: lower starting temperature,
    /// slower cooling.
    fn refinement_profile(&self) -> AnnealProfile {
        let rate = self.config.initial_cooling_rate;
        AnnealProfile {
            initial_temp: (self.config.initial_temp * 0.25).max(self.config.min_temp * 2.0),
            min_temp: self.config.min_temp,
            initial_cooling_rate: (rate + (0.99 - rate) * 0.5).min(0.99),
            cooling_increment: self.config.cooling_increment,
            reheating_boost: self.config.reheating_boost,
            reheat_counter: self.config.reheat_counter,
        }
    }
}

/// Scatter shapes uniformly over a square roughly twice their combined area.
fn random_solution(shapes: &[Arc<Shape>], overlap_penalty: f64, rng: &mut PcgRng) -> Solution {
    let total_area: usize = shapes.iter().map(|s| s.cell_count()).sum();
    let side = ((total_area as f64 * 2.0).sqrt().ceil() as i32).max(1);
    let placements = shapes
        .iter()
        .map(|s| Placement::new(Arc::clone(s), rng.gen_range(0..side), rng.gen_range(0..side)))
        .collect();
    Solution::new(placements, overlap_penalty)
}
