use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use puzzle_core::model::{DatabaseId, Puzzle, PuzzleId, RatingRange};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Summary row for a puzzle database, as shown in a database picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub id: DatabaseId,
    pub title: String,
    pub puzzle_count: u32,
}

/// Insert shape for a puzzle; ids are assigned by the backend.
#[derive(Debug, Clone)]
pub struct NewPuzzle {
    pub fen: String,
    pub moves: Vec<String>,
    pub rating: i32,
}

/// Repository contract for puzzle databases.
///
/// Selection queries are deliberately narrow: the selector in the services
/// layer owns session caches and ordering policy, the repository only
/// answers single-puzzle lookups.
#[async_trait]
pub trait PuzzleRepository: Send + Sync {
    /// List available puzzle databases.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>, StorageError>;

    /// Fetch the fixed rating bounds of a database.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for a missing or empty database.
    async fn rating_bounds(&self, db: DatabaseId) -> Result<RatingRange, StorageError>;

    /// Pick a uniformly random puzzle with rating in `range`, skipping ids in
    /// `exclude`. `Ok(None)` means nothing matched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the database does not exist, or
    /// other storage errors.
    async fn random_puzzle(
        &self,
        db: DatabaseId,
        range: RatingRange,
        exclude: &[PuzzleId],
    ) -> Result<Option<Puzzle>, StorageError>;

    /// Fetch the next puzzle by ascending id with rating in `range`, strictly
    /// after `after` (or from the start when `None`). `Ok(None)` means the
    /// cursor is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the database does not exist, or
    /// other storage errors.
    async fn puzzle_after(
        &self,
        db: DatabaseId,
        range: RatingRange,
        after: Option<PuzzleId>,
    ) -> Result<Option<Puzzle>, StorageError>;

    /// Create an empty puzzle database.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the database cannot be created.
    async fn create_database(&self, title: &str) -> Result<DatabaseId, StorageError>;

    /// Append puzzles to a database, returning the assigned ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the database does not exist, or
    /// `StorageError::Serialization` for rows that fail domain validation.
    async fn insert_puzzles(
        &self,
        db: DatabaseId,
        puzzles: &[NewPuzzle],
    ) -> Result<Vec<PuzzleId>, StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

#[derive(Debug, Default)]
struct DatabaseEntry {
    title: String,
    puzzles: BTreeMap<PuzzleId, Puzzle>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    databases: Arc<Mutex<HashMap<DatabaseId, DatabaseEntry>>>,
    next_db_id: Arc<Mutex<u64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_databases(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<DatabaseId, DatabaseEntry>>, StorageError> {
        self.databases
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl PuzzleRepository for InMemoryRepository {
    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>, StorageError> {
        let guard = self.lock_databases()?;
        let mut infos: Vec<DatabaseInfo> = guard
            .iter()
            .map(|(id, entry)| {
                let puzzle_count = u32::try_from(entry.puzzles.len()).unwrap_or(u32::MAX);
                DatabaseInfo {
                    id: *id,
                    title: entry.title.clone(),
                    puzzle_count,
                }
            })
            .collect();
        infos.sort_by_key(|info| info.id);
        Ok(infos)
    }

    async fn rating_bounds(&self, db: DatabaseId) -> Result<RatingRange, StorageError> {
        let guard = self.lock_databases()?;
        let entry = guard.get(&db).ok_or(StorageError::NotFound)?;

        let mut ratings = entry.puzzles.values().map(Puzzle::rating);
        let first = ratings.next().ok_or(StorageError::NotFound)?;
        let (min, max) = ratings.fold((first, first), |(lo, hi), rating| {
            (lo.min(rating), hi.max(rating))
        });

        RatingRange::new(min, max).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn random_puzzle(
        &self,
        db: DatabaseId,
        range: RatingRange,
        exclude: &[PuzzleId],
    ) -> Result<Option<Puzzle>, StorageError> {
        let guard = self.lock_databases()?;
        let entry = guard.get(&db).ok_or(StorageError::NotFound)?;

        let excluded: HashSet<PuzzleId> = exclude.iter().copied().collect();
        let eligible: Vec<&Puzzle> = entry
            .puzzles
            .values()
            .filter(|p| range.contains(p.rating()) && !excluded.contains(&p.id()))
            .collect();

        Ok(eligible.choose(&mut rand::rng()).map(|p| (*p).clone()))
    }

    async fn puzzle_after(
        &self,
        db: DatabaseId,
        range: RatingRange,
        after: Option<PuzzleId>,
    ) -> Result<Option<Puzzle>, StorageError> {
        let guard = self.lock_databases()?;
        let entry = guard.get(&db).ok_or(StorageError::NotFound)?;

        let next = entry
            .puzzles
            .values()
            .filter(|p| range.contains(p.rating()))
            .find(|p| after.is_none_or(|cursor| p.id() > cursor));

        Ok(next.cloned())
    }

    async fn create_database(&self, title: &str) -> Result<DatabaseId, StorageError> {
        let mut counter = self
            .next_db_id
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *counter += 1;
        let id = DatabaseId::new(*counter);

        let mut guard = self.lock_databases()?;
        guard.insert(
            id,
            DatabaseEntry {
                title: title.to_owned(),
                puzzles: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    async fn insert_puzzles(
        &self,
        db: DatabaseId,
        puzzles: &[NewPuzzle],
    ) -> Result<Vec<PuzzleId>, StorageError> {
        let mut guard = self.lock_databases()?;
        let entry = guard.get_mut(&db).ok_or(StorageError::NotFound)?;

        let mut next_id = entry
            .puzzles
            .last_key_value()
            .map_or(0, |(id, _)| id.value())
            + 1;

        // Validate the whole batch before writing anything, so a bad row
        // cannot leave earlier rows committed.
        let mut validated = Vec::with_capacity(puzzles.len());
        for row in puzzles {
            let id = PuzzleId::new(next_id);
            let puzzle = Puzzle::new(id, row.fen.clone(), row.moves.clone(), row.rating)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            validated.push(puzzle);
            next_id += 1;
        }

        let mut assigned = Vec::with_capacity(validated.len());
        for puzzle in validated {
            assigned.push(puzzle.id());
            entry.puzzles.insert(puzzle.id(), puzzle);
        }
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_puzzle(rating: i32) -> NewPuzzle {
        NewPuzzle {
            fen: "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1".into(),
            moves: vec!["d1d8".into()],
            rating,
        }
    }

    async fn seed(repo: &InMemoryRepository, ratings: &[i32]) -> DatabaseId {
        let db = repo.create_database("Tactics").await.unwrap();
        let rows: Vec<NewPuzzle> = ratings.iter().map(|r| new_puzzle(*r)).collect();
        repo.insert_puzzles(db, &rows).await.unwrap();
        db
    }

    #[tokio::test]
    async fn bounds_cover_min_and_max_rating() {
        let repo = InMemoryRepository::new();
        let db = seed(&repo, &[1200, 900, 1700]).await;

        let bounds = repo.rating_bounds(db).await.unwrap();
        assert_eq!(bounds.min(), 900);
        assert_eq!(bounds.max(), 1700);
    }

    #[tokio::test]
    async fn random_puzzle_respects_range_and_exclusions() {
        let repo = InMemoryRepository::new();
        let db = seed(&repo, &[1000, 1100, 1900]).await;
        let range = RatingRange::new(950, 1200).unwrap();

        let first = repo.random_puzzle(db, range, &[]).await.unwrap().unwrap();
        assert!(range.contains(first.rating()));

        let second = repo
            .random_puzzle(db, range, &[first.id()])
            .await
            .unwrap()
            .unwrap();
        assert_ne!(second.id(), first.id());

        let exhausted = repo
            .random_puzzle(db, range, &[first.id(), second.id()])
            .await
            .unwrap();
        assert!(exhausted.is_none());
    }

    #[tokio::test]
    async fn puzzle_after_walks_ids_in_order() {
        let repo = InMemoryRepository::new();
        let db = seed(&repo, &[1000, 1100, 1200]).await;
        let range = RatingRange::new(0, 3000).unwrap();

        let mut cursor = None;
        let mut seen = Vec::new();
        while let Some(puzzle) = repo.puzzle_after(db, range, cursor).await.unwrap() {
            cursor = Some(puzzle.id());
            seen.push(puzzle.id());
        }

        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn failed_batch_leaves_the_database_untouched() {
        let repo = InMemoryRepository::new();
        let db = repo.create_database("Tactics").await.unwrap();

        let rows = vec![
            new_puzzle(1000),
            NewPuzzle {
                fen: "   ".into(),
                moves: vec!["e2e4".into()],
                rating: 1100,
            },
        ];
        let err = repo.insert_puzzles(db, &rows).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));

        // no row from the failed batch is visible
        let range = RatingRange::new(0, 3000).unwrap();
        assert!(repo.puzzle_after(db, range, None).await.unwrap().is_none());
        assert!(matches!(
            repo.rating_bounds(db).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn empty_database_has_no_bounds() {
        let repo = InMemoryRepository::new();
        let db = repo.create_database("Empty").await.unwrap();
        assert!(matches!(
            repo.rating_bounds(db).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_database_is_not_found() {
        let repo = InMemoryRepository::new();
        let db = DatabaseId::new(999);
        let range = RatingRange::new(0, 3000).unwrap();
        assert!(matches!(
            repo.random_puzzle(db, range, &[]).await,
            Err(StorageError::NotFound)
        ));
    }
}
