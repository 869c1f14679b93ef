#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Tracks which bay token sits in which gap.
pub mod placement;
/// Turns a board back into program text.
pub mod reassemble;
/// Picks tokens off a source file.
pub mod shuffle;
/// Tokenized programs.
pub mod source;
/// The atomic unit of a puzzle.
pub mod token;

pub use placement::PlacementState;
pub use reassemble::{reassemble, reassemble_lenient};
pub use shuffle::{BayId, BayToken, Difficulty, ShuffledSource, Shuffler, Slot};
pub use source::SourceFile;
pub use token::{Token, TokenKind};

/// An enum to represent the ways a puzzle operation can be refused.
///
/// These are precondition violations: the caller gets them back synchronously
/// and nothing it owns has been modified.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// A difficulty outside of `0..=100` was requested
    #[error("Difficulty must be a percentage between 0 and 100, got {0}")]
    InvalidDifficulty(i64),
    /// The source to shuffle has no token at all
    #[error("Cannot shuffle a source file without tokens")]
    EmptySource,
    /// The bay token did not come out of this shuffle
    #[error("Token #{0} does not belong to this puzzle")]
    UnknownToken(usize),
    /// The board still has gaps nobody filled
    #[error("{unfilled} gap(s) still need a token")]
    IncompletePlacement {
        /// how many gaps are still empty
        unfilled: usize,
    },
    /// No gap with this number exists on the board
    #[error("There is no gap #{gap} (the board has {gaps})")]
    GapOutOfRange {
        /// the gap asked for
        gap:  usize,
        /// number of gaps on the board
        gaps: usize,
    },
    /// Something already sits in the gap
    #[error("Gap #{0} is already filled")]
    GapOccupied(usize),
    /// The token already sits in another gap
    #[error("Token #{token} is already placed in gap #{gap}")]
    TokenAlreadyPlaced {
        /// the token being placed
        token: usize,
        /// where it currently sits
        gap:   usize,
    },
}
