//! Negamax alpha-beta search with transposition table, null-move
//! pruning, check extension, and a capture-only quiescence extension at
//! the horizon.

use sable_core::{Board, Move, PieceKind, generate_capture_moves, generate_moves};

use crate::eval::{PIECE_VALUES, evaluate};
use crate::search::control::SearchControl;
use crate::search::heuristics::{ContinuationHistory, KillerTable, SearchStack};
use crate::search::ordering::MovePicker;
use crate::search::tt::{Bound, TranspositionTable};

/// Maximum iterative-deepening depth.
pub const MAX_DEPTH: i32 = 64;

/// Maximum recursion depth in plies; check extensions can push a line
/// past the nominal depth.
pub const MAX_PLY: usize = 256;

/// Score for delivering checkmate at the root. Mate at ply `p` scores
/// `MATE - p`, so shorter mates score higher.
pub const MATE: i32 = 32_000;

/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = MATE - MAX_PLY as i32;

/// Score for drawn positions.
pub const DRAW: i32 = 0;

/// Bound strictly outside every reachable score.
pub const INF: i32 = MATE + 1;

/// Everything one search shares across its recursion: counters, the
/// cancellation window, the heuristic tables, and the per-ply stack.
///
/// The tables live here rather than at module scope so a `Searcher` can
/// run searches back to back without global state.
pub(super) struct SearchContext<'a> {
    pub nodes: u64,
    pub tt: &'a mut TranspositionTable,
    pub control: &'a SearchControl,
    pub killers: KillerTable,
    pub cont_history: ContinuationHistory,
    pub stack: SearchStack,
    /// Guard against two null moves in a row; re-armed by the driver at
    /// the start of every iteration.
    pub can_null_move: bool,
    pub iter_best_move: Option<Move>,
    pub iter_best_score: i32,
}

impl<'a> SearchContext<'a> {
    pub(super) fn new(tt: &'a mut TranspositionTable, control: &'a SearchControl) -> Self {
        SearchContext {
            nodes: 0,
            tt,
            control,
            killers: KillerTable::new(),
            cont_history: ContinuationHistory::new(),
            stack: SearchStack::new(),
            can_null_move: true,
            iter_best_move: None,
            iter_best_score: -INF,
        }
    }

    fn record_root(&mut self, mv: Move, score: i32) {
        self.iter_best_move = Some(mv);
        self.iter_best_score = score;
    }
}

/// Negamax alpha-beta search. Returns the score of the position from
/// the side to move's perspective; at the root, also records the
/// iteration best in the context.
///
/// A return of 0 after cancellation is a sentinel, not a score; the
/// driver discards interrupted results via the control's stop flag.
pub(super) fn negamax(
    board: &mut Board,
    mut depth: i32,
    ply: usize,
    mut alpha: i32,
    mut beta: i32,
    ctx: &mut SearchContext,
) -> i32 {
    // Game-level draws. Never at the root: a best move must exist there.
    if ply > 0 && (board.halfmove_clock() >= 100 || board.is_repetition()) {
        return DRAW;
    }

    let alpha_original = alpha;

    let mut tt_move = Move::NULL;
    if let Some(hit) = ctx.tt.probe(board.hash(), ply) {
        tt_move = hit.best_move;
        if i32::from(hit.depth) >= depth {
            match hit.bound {
                Bound::Exact => {
                    if ply == 0 {
                        ctx.record_root(hit.best_move, hit.score);
                    }
                    return hit.score;
                }
                Bound::LowerBound => alpha = alpha.max(hit.score),
                Bound::UpperBound => beta = beta.min(hit.score),
                Bound::None => {}
            }
            if alpha >= beta {
                if ply == 0 {
                    ctx.record_root(hit.best_move, hit.score);
                }
                return hit.score;
            }
        }
    }

    if ctx.control.should_stop(ctx.nodes) {
        return 0;
    }

    // Perpetual-check lines keep extending; cut them off at the stack
    // ceiling.
    if ply >= MAX_PLY - 1 {
        return evaluate(board);
    }

    let in_check = board.in_check(board.side_to_move());
    if in_check {
        depth += 1;
    }

    if depth <= 0 {
        ctx.nodes += 1;
        return quiesce(board, alpha, beta);
    }

    if ctx.can_null_move && depth > 2 && !in_check {
        ctx.can_null_move = false;
        board.make_null_move();
        // The null ply has no continuation sub-table.
        ctx.stack.set(ply + 1, Move::NULL, None);

        let reduction = if depth > 6 { 3 } else { 2 };
        let null_score = -negamax(board, depth - reduction, ply + 1, -beta, -alpha, ctx);

        board.undo_move();
        ctx.can_null_move = true;

        if ctx.control.should_stop(ctx.nodes) {
            return 0;
        }
        if null_score >= beta {
            return beta;
        }
    }

    let moves = generate_moves(board);
    let mut picker = MovePicker::new_search(
        &moves,
        board,
        tt_move,
        &ctx.killers,
        &ctx.cont_history,
        &ctx.stack,
        ply,
    );

    let mut best_score = -INF;
    let mut best_move = Move::NULL;
    let mut moves_tried = 0u32;
    let mut quiets_tried = [Move::NULL; 256];
    let mut quiets_len = 0usize;

    while let Some(mv) = picker.next() {
        let is_capture = board.is_capture(mv);

        // Install the continuation sub-table for the child ply before
        // descending, so its quiets can be scored against this move.
        let cont_index = ContinuationHistory::index_for(board, mv);
        ctx.stack.set(ply + 1, mv, cont_index);

        board.make_move(mv);
        // Pseudo-legal generation: discard moves leaving our king in
        // check.
        if board.in_check(board.side_to_move().flip()) {
            board.undo_move();
            continue;
        }

        let score = -negamax(board, depth - 1, ply + 1, -beta, -alpha, ctx);
        moves_tried += 1;
        board.undo_move();

        if ctx.control.should_stop(ctx.nodes) {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = mv;
            if ply == 0 {
                ctx.record_root(mv, score);
            }
        }

        alpha = alpha.max(best_score);
        if alpha >= beta {
            // A quiet refutation is worth remembering.
            if !is_capture {
                ctx.killers.store(ply, mv);
                ctx.cont_history.update(
                    &ctx.stack,
                    board,
                    ply,
                    depth,
                    mv,
                    &quiets_tried[..quiets_len],
                );
            }
            break;
        }

        if !is_capture && quiets_len < quiets_tried.len() {
            quiets_tried[quiets_len] = mv;
            quiets_len += 1;
        }
    }

    if moves_tried == 0 {
        return if in_check { -MATE + ply as i32 } else { DRAW };
    }

    let bound = if best_score <= alpha_original {
        Bound::UpperBound
    } else if best_score >= beta {
        Bound::LowerBound
    } else {
        Bound::Exact
    };
    ctx.tt.store(board.hash(), depth, best_score, best_move, bound, ply);

    best_score
}

/// Capture-only search below the horizon, so leaf evaluations never
/// land mid-exchange.
///
/// Fail-hard: cutoffs return exactly `beta`, and a hopeless node
/// returns `alpha`. Does not consult the transposition table or the
/// history tables.
fn quiesce(board: &mut Board, mut alpha: i32, beta: i32) -> i32 {
    let stand_pat = evaluate(board);
    if stand_pat >= beta {
        return beta;
    }
    // Delta pruning: even winning a queen cannot lift this node to alpha.
    if stand_pat + PIECE_VALUES[PieceKind::Queen.index()] < alpha {
        return alpha;
    }
    alpha = alpha.max(stand_pat);

    let captures = generate_capture_moves(board);
    let mut picker = MovePicker::new_captures(&captures, board);

    while let Some(mv) = picker.next() {
        board.make_move(mv);
        if board.in_check(board.side_to_move().flip()) {
            board.undo_move();
            continue;
        }
        let score = -quiesce(board, -beta, -alpha);
        board.undo_move();

        if score >= beta {
            return beta;
        }
        alpha = alpha.max(score);
    }

    alpha
}
