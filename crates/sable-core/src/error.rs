//! Error types for board construction and FEN parsing.

/// Errors produced when parsing a FEN string.
#[derive(Debug, thiserror::Error)]
pub enum FenError {
    /// The FEN did not contain exactly six whitespace-separated fields.
    #[error("expected 6 FEN fields, found {found}")]
    WrongFieldCount {
        /// Number of fields found.
        found: usize,
    },

    /// The placement field did not contain exactly eight ranks.
    #[error("expected 8 ranks in placement field, found {found}")]
    WrongRankCount {
        /// Number of ranks found.
        found: usize,
    },

    /// A rank described more or fewer than eight files.
    #[error("rank {rank} describes {length} files")]
    BadRankLength {
        /// Zero-based rank index within the FEN (top rank first).
        rank: usize,
        /// Number of files described.
        length: usize,
    },

    /// An unrecognized character in the placement field.
    #[error("invalid piece character '{character}'")]
    InvalidPieceChar {
        /// The offending character.
        character: char,
    },

    /// The active-color field was not "w" or "b".
    #[error("invalid active color: {found}")]
    InvalidColor {
        /// The field as found.
        found: String,
    },

    /// The castling field was malformed.
    #[error("invalid castling field: {found}")]
    InvalidCastling {
        /// The field as found.
        found: String,
    },

    /// The en passant field was neither "-" nor a square.
    #[error("invalid en passant field: {found}")]
    InvalidEnPassant {
        /// The field as found.
        found: String,
    },

    /// A move counter failed to parse.
    #[error("invalid {field}: {found}")]
    InvalidMoveCounter {
        /// Which counter ("halfmove clock" or "fullmove number").
        field: &'static str,
        /// The field as found.
        found: String,
    },

    /// The parsed position failed structural validation.
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Structural violations of a chess position.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// A side does not have exactly one king.
    #[error("{color} has {count} kings")]
    InvalidKingCount {
        /// Side name.
        color: &'static str,
        /// King count found.
        count: u32,
    },

    /// A pawn sits on rank 1 or rank 8.
    #[error("pawns on a back rank")]
    PawnsOnBackRank,

    /// Two piece bitboards claim the same square.
    #[error("overlapping piece bitboards")]
    OverlappingPieces,
}
