use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use puzzle_core::model::{DatabaseId, Puzzle, PuzzleId, RatingRange};
use storage::repository::PuzzleRepository;

use crate::error::SelectorError;

/// Stateful cursor over puzzle databases.
///
/// Wraps the repository with per-database session caches: fetched rating
/// bounds, the ids already served in random mode (to reduce repeats), and
/// the position of the sequential cursor for in-order mode. The caches are
/// session-scoped; `clear_cache` drops them on reset or database switch.
pub struct PuzzleSelector {
    repo: Arc<dyn PuzzleRepository>,
    bounds: HashMap<DatabaseId, RatingRange>,
    served: HashMap<DatabaseId, HashSet<PuzzleId>>,
    cursors: HashMap<DatabaseId, PuzzleId>,
}

impl PuzzleSelector {
    #[must_use]
    pub fn new(repo: Arc<dyn PuzzleRepository>) -> Self {
        Self {
            repo,
            bounds: HashMap::new(),
            served: HashMap::new(),
            cursors: HashMap::new(),
        }
    }

    /// Fixed rating bounds of a database, fetched once and cached.
    ///
    /// # Errors
    ///
    /// Returns `SelectorError::Storage` for missing databases or backend
    /// failures.
    pub async fn bounds(&mut self, db: DatabaseId) -> Result<RatingRange, SelectorError> {
        if let Some(bounds) = self.bounds.get(&db) {
            return Ok(*bounds);
        }
        let bounds = self.repo.rating_bounds(db).await?;
        self.bounds.insert(db, bounds);
        Ok(bounds)
    }

    /// Yield the next puzzle from `db` whose rating falls in `range`.
    ///
    /// With `in_order` set, repeated calls walk a stable id ordering without
    /// repeats and loop back to the start once exhausted. Otherwise the pick
    /// is uniformly random, avoiding already-served puzzles until the pool
    /// runs dry, at which point the served set is dropped and reused.
    ///
    /// # Errors
    ///
    /// Returns `SelectorError::EmptyRange` when the database holds no puzzle
    /// in `range` at all, and `SelectorError::Storage` for backend failures.
    pub async fn next_puzzle(
        &mut self,
        db: DatabaseId,
        range: RatingRange,
        in_order: bool,
    ) -> Result<Puzzle, SelectorError> {
        if in_order {
            self.next_in_order(db, range).await
        } else {
            self.next_random(db, range).await
        }
    }

    /// Forget served puzzles and the sequential cursor for a database.
    pub fn clear_cache(&mut self, db: DatabaseId) {
        self.served.remove(&db);
        self.cursors.remove(&db);
    }

    async fn next_in_order(
        &mut self,
        db: DatabaseId,
        range: RatingRange,
    ) -> Result<Puzzle, SelectorError> {
        let cursor = self.cursors.get(&db).copied();

        if let Some(puzzle) = self.repo.puzzle_after(db, range, cursor).await? {
            self.cursors.insert(db, puzzle.id());
            return Ok(puzzle);
        }

        // Exhausted: wrap to the start rather than fail.
        if cursor.is_some() {
            debug!(%db, "sequential cursor exhausted, wrapping around");
            if let Some(puzzle) = self.repo.puzzle_after(db, range, None).await? {
                self.cursors.insert(db, puzzle.id());
                return Ok(puzzle);
            }
        }

        self.cursors.remove(&db);
        Err(SelectorError::EmptyRange { range })
    }

    async fn next_random(
        &mut self,
        db: DatabaseId,
        range: RatingRange,
    ) -> Result<Puzzle, SelectorError> {
        let served: Vec<PuzzleId> = self
            .served
            .get(&db)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        if let Some(puzzle) = self.repo.random_puzzle(db, range, &served).await? {
            self.served.entry(db).or_default().insert(puzzle.id());
            return Ok(puzzle);
        }

        // Every eligible puzzle has been served this session; allow repeats.
        if !served.is_empty() {
            debug!(%db, "served cache exhausted the range, allowing repeats");
            self.served.remove(&db);
            if let Some(puzzle) = self.repo.random_puzzle(db, range, &[]).await? {
                self.served.entry(db).or_default().insert(puzzle.id());
                return Ok(puzzle);
            }
        }

        Err(SelectorError::EmptyRange { range })
    }
}

impl fmt::Debug for PuzzleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleSelector")
            .field("bounds", &self.bounds)
            .field("served_dbs", &self.served.len())
            .field("cursors", &self.cursors)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
