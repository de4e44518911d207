//! Search control: the stop flag and the wall-clock budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How many horizon nodes pass between wall-clock checks inside the
/// search. A power of two so the check reduces to a mask test. The node
/// counter only ticks at the quiescence horizon, so the real interval
/// is several times larger than this figure.
pub const NODE_TIMECHECK_PERIOD: u64 = 1 << 12;

/// Decides when a search must abort.
///
/// The stop flag is the only state shared across threads: the UCI front
/// end (or a timer) sets it, and the search observes it at its sampled
/// check points. The wall-clock budget is folded into the same flag the
/// first time a sampled check sees the deadline passed.
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    budget: Option<Duration>,
}

impl SearchControl {
    /// A control with no time budget; only the external stop flag ends
    /// the search.
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> SearchControl {
        SearchControl {
            stopped,
            start: Instant::now(),
            budget: None,
        }
    }

    /// A control with a single wall-clock budget, measured from now.
    pub fn new_timed(stopped: Arc<AtomicBool>, budget: Duration) -> SearchControl {
        SearchControl {
            stopped,
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    /// Sampled abort check, called inside the search hot path.
    ///
    /// The stop flag is read on every call; the clock only every
    /// [`NODE_TIMECHECK_PERIOD`] nodes. Once the deadline fires the flag
    /// latches, so later calls are flag-reads only.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        if nodes & (NODE_TIMECHECK_PERIOD - 1) != 0 {
            return false;
        }
        self.deadline_passed()
    }

    /// Unsampled check, used between iterative-deepening iterations.
    pub fn should_stop_iterating(&self) -> bool {
        self.stopped.load(Ordering::Relaxed) || self.deadline_passed()
    }

    /// Return `true` if the stop flag has been raised (externally or by
    /// a lapsed deadline).
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Time since the control was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn deadline_passed(&self) -> bool {
        if let Some(budget) = self.budget
            && self.start.elapsed() >= budget
        {
            self.stopped.store(true, Ordering::Release);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn infinite_never_stops_on_its_own() {
        let control = SearchControl::new_infinite(flag());
        assert!(!control.should_stop(0));
        assert!(!control.should_stop(NODE_TIMECHECK_PERIOD));
        assert!(!control.should_stop_iterating());
    }

    #[test]
    fn external_stop_observed_at_any_node_count() {
        let stopped = flag();
        let control = SearchControl::new_infinite(Arc::clone(&stopped));
        assert!(!control.should_stop(1));
        stopped.store(true, Ordering::Release);
        assert!(control.should_stop(1), "flag must be seen between clock samples");
    }

    #[test]
    fn lapsed_budget_latches_the_flag() {
        let stopped = flag();
        let control = SearchControl::new_timed(Arc::clone(&stopped), Duration::ZERO);
        // Node count off the sampling boundary: clock not consulted yet.
        assert!(!control.should_stop(1));
        // On the boundary the lapsed deadline fires and latches.
        assert!(control.should_stop(0));
        assert!(stopped.load(Ordering::Acquire));
        assert!(control.should_stop(1));
    }

    #[test]
    fn iteration_check_ignores_sampling() {
        let control = SearchControl::new_timed(flag(), Duration::ZERO);
        assert!(control.should_stop_iterating());
    }

    #[test]
    fn generous_budget_does_not_stop() {
        let control = SearchControl::new_timed(flag(), Duration::from_secs(3600));
        assert!(!control.should_stop(0));
        assert!(!control.should_stop_iterating());
    }
}
