//! The search subsystem: iterative-deepening driver over the negamax
//! core, plus the tables it owns.

pub mod control;
pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod tt;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use sable_core::{Board, Move};
use tracing::info;

use control::SearchControl;
use negamax::{INF, MATE, MAX_DEPTH, SearchContext, negamax};
use tt::TranspositionTable;

/// Result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move found, or `None` when the root has no legal move
    /// (checkmate or stalemate) or the search was stopped before depth 1
    /// produced anything.
    pub best_move: Option<Move>,
    /// Score of `best_move` in centipawns (mate scores near `±MATE`).
    pub score: i32,
    /// Deepest iteration whose result was accepted.
    pub depth: i32,
    /// Nodes counted during the search.
    pub nodes: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Iterative-deepening searcher owning the transposition table.
///
/// The table persists across searches (and so across moves of a game)
/// until [`Searcher::clear_tt`] is called.
pub struct Searcher {
    tt: TranspositionTable,
    /// Whether an interrupted iteration's partial best move may replace
    /// the last completed one. The partial is only ever recorded after a
    /// full subtree of the root finished, so accepting it is sound and
    /// uses the extra work; discarding is the conservative choice.
    accept_partial: bool,
}

/// Default transposition table size in megabytes.
const DEFAULT_TT_MB: usize = 32;

impl Searcher {
    /// Create a searcher with the default table size.
    pub fn new() -> Searcher {
        Searcher {
            tt: TranspositionTable::new(DEFAULT_TT_MB),
            accept_partial: true,
        }
    }

    /// Replace the transposition table with one of the given size in
    /// megabytes.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    /// Empty the transposition table (e.g. on `ucinewgame`).
    pub fn clear_tt(&mut self) {
        self.tt.clear();
    }

    /// Configure acceptance of partial iteration results on
    /// cancellation.
    pub fn set_accept_partial(&mut self, accept: bool) {
        self.accept_partial = accept;
    }

    /// Run iterative deepening up to `max_depth` under `control`.
    ///
    /// `on_iter(depth, score, nodes, best_move)` fires for every
    /// iteration whose result is accepted, in depth order.
    pub fn search<F>(
        &mut self,
        board: &mut Board,
        max_depth: i32,
        control: &SearchControl,
        mut on_iter: F,
    ) -> SearchResult
    where
        F: FnMut(i32, i32, u64, Move),
    {
        let mut ctx = SearchContext::new(&mut self.tt, control);

        let mut best_move = None;
        let mut best_score = -INF;
        let mut best_depth = 0;

        for depth in 1..=max_depth.min(MAX_DEPTH) {
            ctx.iter_best_move = None;
            ctx.iter_best_score = -INF;
            ctx.can_null_move = true;

            negamax(board, depth, 0, -MATE, MATE, &mut ctx);

            let interrupted = control.is_stopped();
            if let Some(mv) = ctx.iter_best_move
                && (!interrupted || self.accept_partial)
            {
                best_move = Some(mv);
                best_score = ctx.iter_best_score;
                best_depth = depth;
                on_iter(depth, best_score, ctx.nodes, mv);
            }

            if control.should_stop_iterating() {
                break;
            }
        }

        SearchResult {
            best_move,
            score: best_score,
            depth: best_depth,
            nodes: ctx.nodes,
            elapsed: control.elapsed(),
        }
    }

    /// Search the position under a wall-clock budget and return the best
    /// move, logging per-iteration progress and a final summary.
    ///
    /// Returns `None` when the side to move has no legal move.
    pub fn find_best_move(&mut self, board: &mut Board, budget: Duration) -> Option<Move> {
        let stopped = Arc::new(AtomicBool::new(false));
        let control = SearchControl::new_timed(stopped, budget);

        let result = self.search(board, MAX_DEPTH, &control, |depth, score, _nodes, mv| {
            info!(
                depth,
                eval = score as f64 / 100.0,
                best = %mv,
                "iteration finished"
            );
        });

        let elapsed = result.elapsed;
        let nps = result.nodes as f64 / elapsed.as_secs_f64().max(1e-6);
        info!(
            nodes = result.nodes,
            nps = nps as u64,
            elapsed_ms = elapsed.as_millis() as u64,
            "search finished"
        );

        result.best_move
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("tt", &self.tt)
            .field("accept_partial", &self.accept_partial)
            .finish()
    }
}
