use puzzle_core::model::{DatabaseId, Puzzle, PuzzleId, RatingRange};

use super::{SqliteRepository, mapping::map_puzzle_row};
use crate::repository::{DatabaseInfo, NewPuzzle, PuzzleRepository, StorageError};

fn database_id_i64(db: DatabaseId) -> Result<i64, StorageError> {
    i64::try_from(db.value()).map_err(|_| StorageError::Serialization("database_id overflow".into()))
}

fn puzzle_id_i64(id: PuzzleId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("puzzle_id overflow".into()))
}

impl SqliteRepository {
    async fn ensure_database(&self, db: DatabaseId) -> Result<(), StorageError> {
        let row = sqlx::query("SELECT 1 FROM puzzle_databases WHERE id = ?1")
            .bind(database_id_i64(db)?)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if row.is_none() {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PuzzleRepository for SqliteRepository {
    async fn list_databases(&self) -> Result<Vec<DatabaseInfo>, StorageError> {
        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            r"
            SELECT d.id, d.title, COUNT(p.id)
            FROM puzzle_databases d
            LEFT JOIN puzzles p ON p.database_id = d.id
            GROUP BY d.id, d.title
            ORDER BY d.id ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut infos = Vec::with_capacity(rows.len());
        for (id, title, count) in rows {
            let id = u64::try_from(id)
                .map_err(|_| StorageError::Serialization("negative database id".into()))?;
            let puzzle_count = u32::try_from(count)
                .map_err(|_| StorageError::Serialization("puzzle count overflow".into()))?;
            infos.push(DatabaseInfo {
                id: DatabaseId::new(id),
                title,
                puzzle_count,
            });
        }
        Ok(infos)
    }

    async fn rating_bounds(&self, db: DatabaseId) -> Result<RatingRange, StorageError> {
        self.ensure_database(db).await?;

        let (min, max) = sqlx::query_as::<_, (Option<i64>, Option<i64>)>(
            "SELECT MIN(rating), MAX(rating) FROM puzzles WHERE database_id = ?1",
        )
        .bind(database_id_i64(db)?)
        .fetch_one(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // MIN/MAX come back NULL for an empty database.
        let (Some(min), Some(max)) = (min, max) else {
            return Err(StorageError::NotFound);
        };

        let min = i32::try_from(min)
            .map_err(|_| StorageError::Serialization("rating overflow".into()))?;
        let max = i32::try_from(max)
            .map_err(|_| StorageError::Serialization("rating overflow".into()))?;

        RatingRange::new(min, max).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn random_puzzle(
        &self,
        db: DatabaseId,
        range: RatingRange,
        exclude: &[PuzzleId],
    ) -> Result<Option<Puzzle>, StorageError> {
        self.ensure_database(db).await?;

        let mut sql = String::from(
            r"
            SELECT id, fen, moves, rating
            FROM puzzles
            WHERE database_id = ?1
              AND rating BETWEEN ?2 AND ?3
            ",
        );

        if !exclude.is_empty() {
            sql.push_str("  AND id NOT IN (");
            for i in 0..exclude.len() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push('?');
                sql.push_str(&(i + 4).to_string());
            }
            sql.push_str(")\n");
        }
        sql.push_str("ORDER BY RANDOM() LIMIT 1");

        let mut q = sqlx::query(&sql)
            .bind(database_id_i64(db)?)
            .bind(i64::from(range.min()))
            .bind(i64::from(range.max()));
        for id in exclude {
            q = q.bind(puzzle_id_i64(*id)?);
        }

        let row = q
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_puzzle_row).transpose()
    }

    async fn puzzle_after(
        &self,
        db: DatabaseId,
        range: RatingRange,
        after: Option<PuzzleId>,
    ) -> Result<Option<Puzzle>, StorageError> {
        self.ensure_database(db).await?;

        let cursor = match after {
            Some(id) => puzzle_id_i64(id)?,
            None => -1,
        };

        let row = sqlx::query(
            r"
            SELECT id, fen, moves, rating
            FROM puzzles
            WHERE database_id = ?1
              AND rating BETWEEN ?2 AND ?3
              AND id > ?4
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .bind(database_id_i64(db)?)
        .bind(i64::from(range.min()))
        .bind(i64::from(range.max()))
        .bind(cursor)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_puzzle_row).transpose()
    }

    async fn create_database(&self, title: &str) -> Result<DatabaseId, StorageError> {
        let result = sqlx::query("INSERT INTO puzzle_databases (title) VALUES (?1)")
            .bind(title)
            .execute(self.pool())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let id = u64::try_from(result.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("negative database id".into()))?;
        Ok(DatabaseId::new(id))
    }

    async fn insert_puzzles(
        &self,
        db: DatabaseId,
        puzzles: &[NewPuzzle],
    ) -> Result<Vec<PuzzleId>, StorageError> {
        self.ensure_database(db).await?;

        let db_id = database_id_i64(db)?;
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let (next,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COALESCE(MAX(id), 0) + 1 FROM puzzles WHERE database_id = ?1",
        )
        .bind(db_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut assigned = Vec::with_capacity(puzzles.len());
        for (offset, row) in puzzles.iter().enumerate() {
            let id = next + i64::try_from(offset)
                .map_err(|_| StorageError::Serialization("puzzle batch overflow".into()))?;

            // Validate through the domain constructor before writing.
            let id_u64 = u64::try_from(id)
                .map_err(|_| StorageError::Serialization("negative puzzle id".into()))?;
            let puzzle = Puzzle::new(
                PuzzleId::new(id_u64),
                row.fen.clone(),
                row.moves.clone(),
                row.rating,
            )
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

            sqlx::query(
                r"
                INSERT INTO puzzles (id, database_id, fen, moves, rating)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(id)
            .bind(db_id)
            .bind(puzzle.fen())
            .bind(puzzle.moves().join(" "))
            .bind(i64::from(puzzle.rating()))
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            assigned.push(puzzle.id());
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(assigned)
    }
}
