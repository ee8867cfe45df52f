use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use puzzle_core::model::{Puzzle, PuzzleId};

use crate::repository::StorageError;

/// Map a `puzzles` row (id, fen, moves, rating) to a domain `Puzzle`.
///
/// The solution line is stored as a single space-separated column.
pub fn map_puzzle_row(row: &SqliteRow) -> Result<Puzzle, StorageError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let fen: String = row
        .try_get("fen")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let moves: String = row
        .try_get("moves")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let rating: i64 = row
        .try_get("rating")
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let id = u64::try_from(id)
        .map_err(|_| StorageError::Serialization("negative puzzle id".into()))?;
    let rating = i32::try_from(rating)
        .map_err(|_| StorageError::Serialization("rating overflow".into()))?;

    let moves: Vec<String> = moves.split_whitespace().map(str::to_owned).collect();

    Puzzle::new(PuzzleId::new(id), fen, moves, rating)
        .map_err(|e| StorageError::Serialization(e.to_string()))
}
