use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::PuzzleId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PuzzleError {
    #[error("puzzle position is empty")]
    EmptyPosition,

    #[error("puzzle has no solution moves")]
    NoSolution,
}

/// A tactics puzzle: a starting position, the solution line, and a rating.
///
/// Immutable once fetched from storage. Move legality and solution
/// verification belong to the chess-rules collaborator, not this type; the
/// constructor only rejects shapes that can never be played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    id: PuzzleId,
    fen: String,
    moves: Vec<String>,
    rating: i32,
}

impl Puzzle {
    /// Build a puzzle from its parts.
    ///
    /// # Errors
    ///
    /// Returns `PuzzleError::EmptyPosition` if `fen` is blank and
    /// `PuzzleError::NoSolution` if the solution line is empty.
    pub fn new(
        id: PuzzleId,
        fen: impl Into<String>,
        moves: Vec<String>,
        rating: i32,
    ) -> Result<Self, PuzzleError> {
        let fen = fen.into();
        if fen.trim().is_empty() {
            return Err(PuzzleError::EmptyPosition);
        }
        if moves.is_empty() {
            return Err(PuzzleError::NoSolution);
        }

        Ok(Self {
            id,
            fen,
            moves,
            rating,
        })
    }

    #[must_use]
    pub fn id(&self) -> PuzzleId {
        self.id
    }

    #[must_use]
    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// The solution line, first move played by the opponent.
    #[must_use]
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    #[must_use]
    pub fn rating(&self) -> i32 {
        self.rating
    }
}
