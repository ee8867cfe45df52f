#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{DatabaseInfo, InMemoryRepository, NewPuzzle, PuzzleRepository, StorageError};
pub use sqlite::{SqliteInitError, SqliteRepository};
