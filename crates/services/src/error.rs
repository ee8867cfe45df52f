//! Shared error types for the services crate.

use thiserror::Error;

use puzzle_core::model::RatingRange;
use storage::repository::StorageError;

/// Errors emitted by `PuzzleSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no puzzle in session")]
    NoCurrentPuzzle,

    #[error("attempt already completed")]
    AlreadyCompleted,

    #[error("only the latest attempt can be completed")]
    NotCurrentAttempt,

    #[error("puzzle index {index} out of bounds (len {len})")]
    OutOfBounds { index: usize, len: usize },
}

/// Errors emitted by `PuzzleSelector`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SelectorError {
    #[error("no puzzles with rating between {} and {}", range.min(), range.max())]
    EmptyRange { range: RatingRange },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PuzzleTrainer`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrainerError {
    #[error("no puzzle database selected")]
    NoDatabaseSelected,

    #[error("a puzzle generation is already in flight")]
    GenerationInFlight,

    #[error("generation result is stale and was discarded")]
    StaleGeneration,

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
