//! Move-ordering heuristics: killer moves, the history bonus curve, and
//! the continuation history table.

use sable_core::{Board, Color, Move, PieceKind, Square};

use crate::search::negamax::MAX_PLY;

/// Saturation bound for history scores.
pub const HISTORY_MAX: i32 = 16_384;

/// Map search depth to an update magnitude: quadratic growth at shallow
/// depths, capped at 1896.
pub fn history_bonus(depth: i32) -> i32 {
    (4 * depth * depth + 120 * depth - 120).clamp(0, 1896)
}

/// Scale a bonus against the current score so that repeated updates
/// asymptote toward `±HISTORY_MAX` instead of growing without bound.
pub fn scale_bonus(current: i32, bonus: i32) -> i32 {
    bonus - current * bonus.abs() / HISTORY_MAX
}

// ---------------------------------------------------------------------------
// Killer moves
// ---------------------------------------------------------------------------

/// Two quiet moves per ply that recently caused beta cutoffs.
pub struct KillerTable {
    slots: [[Move; 2]; MAX_PLY],
}

impl KillerTable {
    /// Create an empty table.
    pub fn new() -> KillerTable {
        KillerTable {
            slots: [[Move::NULL; 2]; MAX_PLY],
        }
    }

    /// Record a cutoff move at the given ply. Slot 0 shifts to slot 1
    /// unless the move is already in slot 0. Callers must not pass
    /// captures.
    pub fn store(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        if self.slots[ply][0] != mv {
            self.slots[ply][1] = self.slots[ply][0];
            self.slots[ply][0] = mv;
        }
    }

    /// Return which slot holds `mv` at the given ply, if either does.
    pub fn slot_of(&self, ply: usize, mv: Move) -> Option<usize> {
        if ply >= MAX_PLY || mv.is_null() {
            return None;
        }
        if self.slots[ply][0] == mv {
            Some(0)
        } else if self.slots[ply][1] == mv {
            Some(1)
        } else {
            None
        }
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Search stack
// ---------------------------------------------------------------------------

/// Sentinel entries placed below the root so that lookbacks of up to
/// four plies always land on a valid entry.
pub(crate) const STACK_GUARD: usize = 4;

/// Stack offsets consulted by continuation history: one, two, and four
/// plies back.
pub const CONT_HIST_PLIES: [usize; 3] = [1, 2, 4];

/// Identifies one continuation-history sub-table: the mover's side, the
/// piece that moved, and its destination. Stored instead of a borrowed
/// reference so stack entries stay `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContHistIndex {
    pub side: Color,
    pub piece: PieceKind,
    pub to: Square,
}

/// Per-ply search state.
#[derive(Clone, Copy)]
pub struct StackEntry {
    /// The move that led into this ply, or null at the root.
    pub current_move: Move,
    /// Continuation-history sub-table for that move, or `None` for the
    /// root, null moves, and the guard entries. Reads through `None`
    /// yield 0; writes are no-ops.
    pub cont_index: Option<ContHistIndex>,
}

impl StackEntry {
    pub const EMPTY: StackEntry = StackEntry {
        current_move: Move::NULL,
        cont_index: None,
    };
}

/// The per-ply stack, with guard entries below the root so negative
/// offsets never index out of bounds.
pub struct SearchStack {
    entries: [StackEntry; MAX_PLY + STACK_GUARD],
}

impl SearchStack {
    /// Create a stack of empty entries.
    pub fn new() -> SearchStack {
        SearchStack {
            entries: [StackEntry::EMPTY; MAX_PLY + STACK_GUARD],
        }
    }

    /// Record the move entering `ply` and its continuation sub-table.
    #[inline]
    pub fn set(&mut self, ply: usize, mv: Move, cont_index: Option<ContHistIndex>) {
        debug_assert!(ply < MAX_PLY);
        self.entries[ply + STACK_GUARD] = StackEntry {
            current_move: mv,
            cont_index,
        };
    }

    /// The entry `back` plies behind `ply`. Offsets past the root
    /// resolve to guard entries whose continuation index is `None`.
    #[inline]
    pub fn behind(&self, ply: usize, back: usize) -> &StackEntry {
        debug_assert!(back <= STACK_GUARD);
        &self.entries[ply + STACK_GUARD - back]
    }
}

impl Default for SearchStack {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Continuation history
// ---------------------------------------------------------------------------

/// One continuation sub-table: scores for the follow-up move, indexed by
/// the follow-up's (side, piece, destination).
pub struct ContinuationEntry {
    table: [[[i32; 64]; 6]; 2],
}

impl ContinuationEntry {
    #[inline]
    fn get(&self, side: Color, piece: PieceKind, to: Square) -> i32 {
        self.table[side.index()][piece.index()][to.index()]
    }

    #[inline]
    fn get_mut(&mut self, side: Color, piece: PieceKind, to: Square) -> &mut i32 {
        &mut self.table[side.index()][piece.index()][to.index()]
    }
}

/// Scores for (previous move, current move) pairs: the outer dimensions
/// select the previous move's (side, piece, destination), the inner
/// sub-table the current move's.
///
/// ~2.3 MB of zeroed `i32`s; allocated directly on the heap.
pub struct ContinuationHistory {
    table: Box<[[[ContinuationEntry; 64]; 6]; 2]>,
}

impl ContinuationHistory {
    /// Create a zeroed table.
    pub fn new() -> ContinuationHistory {
        use std::alloc::{Layout, alloc_zeroed};
        let layout = Layout::new::<[[[ContinuationEntry; 64]; 6]; 2]>();
        let ptr = unsafe { alloc_zeroed(layout) as *mut [[[ContinuationEntry; 64]; 6]; 2] };
        if ptr.is_null() {
            std::alloc::handle_alloc_error(layout);
        }
        ContinuationHistory {
            table: unsafe { Box::from_raw(ptr) },
        }
    }

    /// The index of the sub-table addressed by `mv` in the current
    /// position. Installed into the stack entry of the child ply before
    /// descending.
    pub fn index_for(board: &Board, mv: Move) -> Option<ContHistIndex> {
        let piece = board.piece_on(mv.from())?;
        Some(ContHistIndex {
            side: board.side_to_move(),
            piece,
            to: mv.to(),
        })
    }

    #[inline]
    fn entry(&self, idx: ContHistIndex) -> &ContinuationEntry {
        &self.table[idx.side.index()][idx.piece.index()][idx.to.index()]
    }

    #[inline]
    fn entry_mut(&mut self, idx: ContHistIndex) -> &mut ContinuationEntry {
        &mut self.table[idx.side.index()][idx.piece.index()][idx.to.index()]
    }

    /// Sum the scores for a move `(side, piece, to)` considered at node
    /// `ply`, across the moves one, two, and four plies before it.
    ///
    /// The move itself would occupy `stack[ply + 1]`, so offset `-1` is
    /// the entry at `ply` — the move that led into this node. Entries
    /// without a continuation index contribute 0.
    pub fn combined_score(
        &self,
        stack: &SearchStack,
        ply: usize,
        side: Color,
        piece: PieceKind,
        to: Square,
    ) -> i32 {
        let mut sum = 0;
        for &back in &CONT_HIST_PLIES {
            if let Some(idx) = stack.behind(ply + 1, back).cont_index {
                sum += self.entry(idx).get(side, piece, to);
            }
        }
        sum
    }

    /// Convenience over [`Self::combined_score`] for a move in the
    /// current position. Returns 0 for moves whose from-square is empty.
    pub fn score_move(&self, stack: &SearchStack, ply: usize, board: &Board, mv: Move) -> i32 {
        match board.piece_on(mv.from()) {
            Some(piece) => {
                self.combined_score(stack, ply, board.side_to_move(), piece, mv.to())
            }
            None => 0,
        }
    }

    /// Add `delta` to the entries for `(side, piece, to)` at every
    /// lookback offset (the same base as [`Self::combined_score`]),
    /// clamped to `±HISTORY_MAX`. Offsets with no continuation index
    /// are skipped.
    fn apply(
        &mut self,
        stack: &SearchStack,
        ply: usize,
        side: Color,
        piece: PieceKind,
        to: Square,
        delta: i32,
    ) {
        for &back in &CONT_HIST_PLIES {
            if let Some(idx) = stack.behind(ply + 1, back).cont_index {
                let slot = self.entry_mut(idx).get_mut(side, piece, to);
                *slot = (*slot + delta).clamp(-HISTORY_MAX, HISTORY_MAX);
            }
        }
    }

    /// Reward `cutoff` and penalize the quiets tried before it, after a
    /// quiet-move beta cutoff at `ply`.
    ///
    /// The bonus for each move is scaled against its *combined* prior
    /// score across all three offsets, so entries saturate well before
    /// `HISTORY_MAX`.
    pub fn update(
        &mut self,
        stack: &SearchStack,
        board: &Board,
        ply: usize,
        depth: i32,
        cutoff: Move,
        quiets: &[Move],
    ) {
        let side = board.side_to_move();
        let bonus = history_bonus(depth);

        if let Some(piece) = board.piece_on(cutoff.from()) {
            let prior = self.combined_score(stack, ply, side, piece, cutoff.to());
            self.apply(stack, ply, side, piece, cutoff.to(), scale_bonus(prior, bonus));
        }

        for &quiet in quiets {
            let Some(piece) = board.piece_on(quiet.from()) else {
                continue;
            };
            let prior = self.combined_score(stack, ply, side, piece, quiet.to());
            self.apply(stack, ply, side, piece, quiet.to(), -scale_bonus(prior, bonus));
        }
    }
}

impl Default for ContinuationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::{Board, Move, Square};

    #[test]
    fn bonus_grows_then_saturates() {
        assert_eq!(history_bonus(0), 0);
        assert!(history_bonus(1) > 0);
        assert!(history_bonus(3) > history_bonus(2));
        assert_eq!(history_bonus(20), 1896);
        assert_eq!(history_bonus(64), 1896);
    }

    #[test]
    fn scale_bonus_shrinks_near_cap() {
        let bonus = 1000;
        assert_eq!(scale_bonus(0, bonus), bonus);
        assert!(scale_bonus(8000, bonus) < bonus);
        assert!(scale_bonus(HISTORY_MAX, bonus) <= 0);
        // Negative scores push positive updates harder.
        assert!(scale_bonus(-8000, bonus) > bonus);
    }

    #[test]
    fn killer_store_and_lookup() {
        let mut killers = KillerTable::new();
        let mv1 = Move::new(Square::E2, Square::E4);
        let mv2 = Move::new(Square::D4, Square::D5);

        killers.store(5, mv1);
        assert_eq!(killers.slot_of(5, mv1), Some(0));
        assert_eq!(killers.slot_of(5, mv2), None);
        assert_eq!(killers.slot_of(6, mv1), None);

        killers.store(5, mv2);
        assert_eq!(killers.slot_of(5, mv2), Some(0));
        assert_eq!(killers.slot_of(5, mv1), Some(1));
    }

    #[test]
    fn killer_restore_same_move_keeps_slot_one() {
        let mut killers = KillerTable::new();
        let mv1 = Move::new(Square::E2, Square::E4);
        let mv2 = Move::new(Square::D4, Square::D5);

        killers.store(0, mv1);
        killers.store(0, mv2);
        killers.store(0, mv2);
        assert_eq!(killers.slot_of(0, mv1), Some(1), "re-storing slot 0 must not evict slot 1");
    }

    #[test]
    fn null_move_never_matches_killer() {
        let killers = KillerTable::new();
        assert_eq!(killers.slot_of(0, Move::NULL), None);
    }

    #[test]
    fn guard_entries_read_as_zero() {
        let cont = ContinuationHistory::new();
        let stack = SearchStack::new();
        let board = Board::starting_position();
        let mv = Move::new(Square::from_algebraic("g1").unwrap(), Square::from_algebraic("f3").unwrap());
        // At the root every lookback lands on the root sentinel or a
        // guard entry.
        assert_eq!(cont.score_move(&stack, 0, &board, mv), 0);
    }

    #[test]
    fn update_through_guard_entries_is_noop() {
        let mut cont = ContinuationHistory::new();
        let stack = SearchStack::new();
        let board = Board::starting_position();
        let mv = Move::new(Square::from_algebraic("g1").unwrap(), Square::from_algebraic("f3").unwrap());
        cont.update(&stack, &board, 0, 10, mv, &[]);
        assert_eq!(cont.score_move(&stack, 0, &board, mv), 0);
    }

    /// Build a stack whose lookback entries all point at real sub-tables,
    /// as they would deep in a search. A move decided at `ply` would sit
    /// at `stack[ply + 1]`, so the offsets land on plies
    /// `ply + 1 - {1, 2, 4}`.
    fn primed_stack(board: &Board) -> (SearchStack, usize) {
        let mut stack = SearchStack::new();
        let prior = Move::new(Square::E2, Square::E4);
        let idx = ContinuationHistory::index_for(board, prior);
        assert!(idx.is_some());
        let ply = 6;
        for back in CONT_HIST_PLIES {
            stack.set(ply + 1 - back, prior, idx);
        }
        (stack, ply)
    }

    #[test]
    fn parent_move_is_the_one_ply_lookback() {
        // The entry installed for the move that led into `ply` must be
        // what offset -1 reads when scoring a reply at `ply`.
        let board = Board::starting_position();
        let mut cont = ContinuationHistory::new();
        let mut stack = SearchStack::new();

        let parent = Move::new(Square::E2, Square::E4);
        let idx = ContinuationHistory::index_for(&board, parent);
        assert!(idx.is_some());
        let ply = 1;
        stack.set(ply, parent, idx);

        let reply = Move::new(Square::from_algebraic("g1").unwrap(), Square::from_algebraic("f3").unwrap());
        assert_eq!(cont.score_move(&stack, ply, &board, reply), 0);

        cont.update(&stack, &board, ply, 5, reply, &[]);
        assert!(
            cont.score_move(&stack, ply, &board, reply) > 0,
            "a cutoff one ply after the parent move must be recorded against it"
        );
    }

    #[test]
    fn cutoff_reward_and_quiet_penalty() {
        let board = Board::starting_position();
        let mut cont = ContinuationHistory::new();
        let (stack, ply) = primed_stack(&board);

        let cutoff = Move::new(Square::from_algebraic("b1").unwrap(), Square::from_algebraic("c3").unwrap());
        let quiet = Move::new(Square::from_algebraic("g1").unwrap(), Square::from_algebraic("f3").unwrap());

        cont.update(&stack, &board, ply, 5, cutoff, &[quiet]);

        assert!(cont.score_move(&stack, ply, &board, cutoff) > 0);
        assert!(cont.score_move(&stack, ply, &board, quiet) < 0);
    }

    #[test]
    fn repeated_cutoffs_converge_below_cap() {
        let board = Board::starting_position();
        let mut cont = ContinuationHistory::new();
        let (stack, ply) = primed_stack(&board);
        let cutoff = Move::new(Square::from_algebraic("b1").unwrap(), Square::from_algebraic("c3").unwrap());

        let mut previous = 0;
        let mut last_step = i32::MAX;
        for _ in 0..1000 {
            cont.update(&stack, &board, ply, 20, cutoff, &[]);
            // All three offsets share one sub-table here, so the
            // combined score is three times the underlying entry.
            let score = cont.score_move(&stack, ply, &board, cutoff);
            assert!(score / 3 < HISTORY_MAX, "entry must stay strictly below the cap");
            let step = score - previous;
            assert!(step >= 0, "gravity must approach the cap monotonically");
            assert!(step <= last_step.max(1), "updates must shrink near the cap");
            last_step = step.max(1);
            previous = score;
        }
        // The fixed point sits where the combined score cancels the
        // bonus, with each entry strictly below the cap.
        assert!(previous / 3 < HISTORY_MAX);
        assert!(previous > HISTORY_MAX / 2);
    }
}
