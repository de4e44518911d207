//! Time management: turn clock information into a single wall-clock
//! search budget.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use sable_core::Color;

use crate::search::control::SearchControl;

/// Compute the budget for one move from the remaining clock and
/// increment.
///
/// Budget = remaining / moves-to-go (default 30, or 25 with an
/// increment) plus three quarters of the increment, capped at a fifth
/// of the remaining time so a long think can never flag the engine.
pub fn compute_budget(
    remaining: Duration,
    increment: Duration,
    moves_to_go: Option<u32>,
) -> Duration {
    let remaining_ms = remaining.as_millis() as u64;
    if remaining_ms < 10 {
        return Duration::from_millis(1);
    }

    let inc_ms = increment.as_millis() as u64;
    let mtg = u64::from(moves_to_go.unwrap_or(if inc_ms > 0 { 25 } else { 30 }).max(1));

    let overhead = 10;
    let usable = remaining_ms.saturating_sub(overhead).max(1);
    let budget = (usable / mtg + inc_ms * 3 / 4).min(usable / 5).max(1);

    Duration::from_millis(budget)
}

/// Build a [`SearchControl`] from UCI `go` parameters.
///
/// Priority: `infinite`, then `movetime`, then the side to move's clock,
/// then (depth-only or bare `go`) no limit.
#[allow(clippy::too_many_arguments)]
pub fn control_from_go(
    wtime: Option<Duration>,
    btime: Option<Duration>,
    winc: Option<Duration>,
    binc: Option<Duration>,
    movestogo: Option<u32>,
    movetime: Option<Duration>,
    infinite: bool,
    side: Color,
    stopped: Arc<AtomicBool>,
) -> SearchControl {
    if infinite {
        return SearchControl::new_infinite(stopped);
    }

    if let Some(mt) = movetime {
        return SearchControl::new_timed(stopped, mt);
    }

    let (remaining, increment) = match side {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };

    if let Some(rem) = remaining {
        let inc = increment.unwrap_or(Duration::ZERO);
        return SearchControl::new_timed(stopped, compute_budget(rem, inc, movestogo));
    }

    SearchControl::new_infinite(stopped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_minutes_no_increment() {
        let budget = compute_budget(Duration::from_secs(300), Duration::ZERO, None);
        // 300s / 30 moves = 10s per move.
        assert!(budget.as_millis() > 8_000, "budget {budget:?}");
        assert!(budget.as_millis() < 12_000, "budget {budget:?}");
    }

    #[test]
    fn increment_extends_the_budget() {
        let without = compute_budget(Duration::from_secs(300), Duration::ZERO, None);
        let with = compute_budget(Duration::from_secs(300), Duration::from_secs(2), None);
        assert!(with > without);
    }

    #[test]
    fn budget_capped_against_flagging() {
        // Huge increment relative to the clock: cap at a fifth of the
        // remaining time.
        let budget = compute_budget(Duration::from_secs(10), Duration::from_secs(60), None);
        assert!(budget.as_millis() <= 2_000, "budget {budget:?}");
    }

    #[test]
    fn nearly_flagged_returns_minimal_budget() {
        assert_eq!(
            compute_budget(Duration::from_millis(5), Duration::ZERO, None),
            Duration::from_millis(1)
        );
        assert_eq!(
            compute_budget(Duration::ZERO, Duration::ZERO, None),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn movestogo_divides_the_clock() {
        let budget = compute_budget(Duration::from_secs(60), Duration::ZERO, Some(10));
        // 60s / 10 = 6s, but capped at a fifth of the clock: 12s cap, so 6s.
        assert!(budget.as_millis() > 4_000, "budget {budget:?}");
        assert!(budget.as_millis() < 8_000, "budget {budget:?}");
    }

    #[test]
    fn infinite_and_movetime_routing() {
        let stopped = Arc::new(AtomicBool::new(false));
        let control = control_from_go(
            None, None, None, None, None, None, true, Color::White, stopped,
        );
        assert!(!control.should_stop_iterating());

        let stopped = Arc::new(AtomicBool::new(false));
        let control = control_from_go(
            None,
            None,
            None,
            None,
            None,
            Some(Duration::from_secs(5)),
            false,
            Color::White,
            stopped,
        );
        assert!(!control.should_stop_iterating());
    }

    #[test]
    fn black_uses_its_own_clock() {
        let stopped = Arc::new(AtomicBool::new(false));
        // White is nearly flagged; Black has plenty. Black to move must
        // not stop immediately.
        let control = control_from_go(
            Some(Duration::from_millis(1)),
            Some(Duration::from_secs(300)),
            None,
            None,
            None,
            None,
            false,
            Color::Black,
            stopped,
        );
        assert!(!control.should_stop_iterating());
    }
}
