//! UCI protocol errors.

/// Errors raised while handling UCI input.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// `position` without `startpos` or `fen`.
    #[error("malformed position command: expected startpos or fen")]
    MalformedPosition,

    /// A FEN string that failed to parse.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The offending FEN.
        fen: String,
    },

    /// A move in the `position ... moves` list that failed to parse.
    #[error("invalid move: {uci_move}")]
    InvalidMove {
        /// The offending move string.
        uci_move: String,
    },

    /// A `go` parameter without its value.
    #[error("missing value for go parameter {param}")]
    MissingGoValue {
        /// Parameter name.
        param: String,
    },

    /// A `go` parameter whose value failed to parse.
    #[error("invalid value for go parameter {param}: {value}")]
    InvalidGoValue {
        /// Parameter name.
        param: String,
        /// The value as found.
        value: String,
    },

    /// An I/O failure on stdin.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying error.
        #[from]
        source: std::io::Error,
    },
}
