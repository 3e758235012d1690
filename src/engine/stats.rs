// -----------------------------------------------------------------------------
// Stats and progress reporting exposed to callers
// -----------------------------------------------------------------------------

use serde::Serialize;

use crate::engine::solution::Solution;

/// Cumulative search statistics, aggregated across all runs of one `run()`
/// invocation. Snapshots are copied out under a lock; see
/// `LayoutOptimizer::capture_stats_snapshot`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AnnealStats {
    pub total_proposals: u64,
    pub total_accepts: u64,

    // Uphill-only counters (delta >= 0)
    pub total_uphill_attempts: u64,
    pub total_uphill_accepts: u64,

    pub total_reheats: u64,
    pub refinement_attempts: u64,

    pub best_score: Option<f64>,
    pub best_history: Vec<f64>,
}

impl AnnealStats {
    pub fn push_best_history(&mut self, v: f64) {
        const MAX: usize = 512;
        self.best_history.push(v);
        if self.best_history.len() > MAX {
            let extra = self.best_history.len() - MAX;
            self.best_history.drain(0..extra);
        }
    }
}

/// Which stage of the top-level protocol an update came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    MultiStart { start: usize },
    Refinement { attempt: u64 },
}

/// Periodic observation of an in-progress run. Within one phase/run,
/// deliveries arrive in increasing iteration order and stop before the
/// terminal result is returned.
#[derive(Clone, Debug)]
pub struct ProgressUpdate {
    pub phase: RunPhase,
    pub iteration: u64,
    pub temperature: f64,
    pub best_score: f64,
    /// Snapshot of the run's best solution so far.
    pub solution: Solution,
}

/// Observational callback invoked during search; no return value is consumed.
pub trait ProgressSink: Sync {
    fn on_progress(&self, update: ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressUpdate) + Sync,
{
    fn on_progress(&self, update: ProgressUpdate) {
        self(update)
    }
}
