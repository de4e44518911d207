//! Static evaluation: material plus piece-square tables.

mod pst;

use sable_core::{Board, Color, PieceKind};

use pst::PIECE_SQUARE_TABLES;

/// Piece values in centipawns, indexed by [`PieceKind::index`]. The king
/// carries no material value.
pub const PIECE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 0];

/// Evaluate the position in centipawns from the side to move's
/// perspective.
pub fn evaluate(board: &Board) -> i32 {
    let mut score = 0;

    for kind in PieceKind::ALL {
        let value = PIECE_VALUES[kind.index()];
        let table = &PIECE_SQUARE_TABLES[kind.index()];

        // Tables are written as seen from White's side of the board, so
        // White indexes through the vertical mirror.
        for sq in board.pieces(kind) & board.side(Color::White) {
            score += value + table[sq.flip_rank().index()];
        }
        for sq in board.pieces(kind) & board.side(Color::Black) {
            score -= value + table[sq.index()];
        }
    }

    match board.side_to_move() {
        Color::White => score,
        Color::Black => -score,
    }
}

#[cfg(test)]
mod tests {
    use super::{PIECE_VALUES, evaluate};
    use sable_core::{Board, PieceKind};

    #[test]
    fn starting_position_is_balanced() {
        let board = Board::starting_position();
        assert_eq!(evaluate(&board), 0);
    }

    #[test]
    fn evaluation_is_symmetric() {
        // The same imbalance must score equal and opposite for the two
        // sides to move.
        let white_up: Board = "4k3/8/8/8/8/8/8/Q3K3 w - - 0 1".parse().unwrap();
        let white_up_black_to_move: Board = "4k3/8/8/8/8/8/8/Q3K3 b - - 0 1".parse().unwrap();
        assert_eq!(evaluate(&white_up), -evaluate(&white_up_black_to_move));
        assert!(evaluate(&white_up) > 0);
    }

    #[test]
    fn extra_pawn_is_roughly_a_pawn() {
        let board: Board = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1".parse().unwrap();
        let score = evaluate(&board);
        assert!(
            (score - PIECE_VALUES[PieceKind::Pawn.index()]).abs() <= 50,
            "score {score} should be near one pawn"
        );
    }

    #[test]
    fn centralized_knight_beats_corner_knight() {
        let central: Board = "4k3/8/8/8/4N3/8/8/4K3 w - - 0 1".parse().unwrap();
        let corner: Board = "4k3/8/8/8/8/8/8/N3K3 w - - 0 1".parse().unwrap();
        assert!(evaluate(&central) > evaluate(&corner));
    }
}
