use puzzle_core::model::{DatabaseId, RatingRange};
use storage::repository::{NewPuzzle, PuzzleRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn new_puzzle(rating: i32, moves: &str) -> NewPuzzle {
    NewPuzzle {
        fen: "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1".into(),
        moves: moves.split_whitespace().map(str::to_owned).collect(),
        rating,
    }
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_lists_databases_and_bounds() {
    let repo = connect("memdb_roundtrip").await;

    let db = repo.create_database("Mate in One").await.unwrap();
    repo.insert_puzzles(
        db,
        &[
            new_puzzle(900, "d1d8"),
            new_puzzle(1500, "d1d8"),
            new_puzzle(1200, "d1d8"),
        ],
    )
    .await
    .unwrap();

    let infos = repo.list_databases().await.unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].id, db);
    assert_eq!(infos[0].title, "Mate in One");
    assert_eq!(infos[0].puzzle_count, 3);

    let bounds = repo.rating_bounds(db).await.unwrap();
    assert_eq!(bounds.min(), 900);
    assert_eq!(bounds.max(), 1500);
}

#[tokio::test]
async fn sqlite_random_puzzle_honors_range_and_exclusions() {
    let repo = connect("memdb_random").await;
    let db = repo.create_database("Tactics").await.unwrap();
    repo.insert_puzzles(
        db,
        &[
            new_puzzle(1000, "d1d8"),
            new_puzzle(1100, "d1d8"),
            new_puzzle(1900, "d1d8"),
        ],
    )
    .await
    .unwrap();

    let range = RatingRange::new(950, 1200).unwrap();
    let first = repo.random_puzzle(db, range, &[]).await.unwrap().unwrap();
    assert!(range.contains(first.rating()));

    let second = repo
        .random_puzzle(db, range, &[first.id()])
        .await
        .unwrap()
        .unwrap();
    assert_ne!(second.id(), first.id());
    assert!(range.contains(second.rating()));

    let exhausted = repo
        .random_puzzle(db, range, &[first.id(), second.id()])
        .await
        .unwrap();
    assert!(exhausted.is_none());
}

#[tokio::test]
async fn sqlite_sequential_cursor_walks_ids_then_exhausts() {
    let repo = connect("memdb_cursor").await;
    let db = repo.create_database("Tactics").await.unwrap();
    let ids = repo
        .insert_puzzles(
            db,
            &[
                new_puzzle(1000, "d1d8"),
                new_puzzle(1100, "d1d8"),
                new_puzzle(1200, "d1d8"),
            ],
        )
        .await
        .unwrap();

    let range = RatingRange::new(0, 3000).unwrap();
    let mut cursor = None;
    let mut seen = Vec::new();
    while let Some(puzzle) = repo.puzzle_after(db, range, cursor).await.unwrap() {
        cursor = Some(puzzle.id());
        seen.push(puzzle.id());
    }

    assert_eq!(seen, ids);
}

#[tokio::test]
async fn sqlite_moves_round_trip_through_text_column() {
    let repo = connect("memdb_moves").await;
    let db = repo.create_database("Tactics").await.unwrap();
    repo.insert_puzzles(db, &[new_puzzle(1200, "e1e8 g8h7 e8a8")])
        .await
        .unwrap();

    let range = RatingRange::new(0, 3000).unwrap();
    let puzzle = repo.puzzle_after(db, range, None).await.unwrap().unwrap();
    assert_eq!(puzzle.moves(), ["e1e8", "g8h7", "e8a8"]);
}

#[tokio::test]
async fn sqlite_missing_database_is_not_found() {
    let repo = connect("memdb_missing").await;
    let range = RatingRange::new(0, 3000).unwrap();

    let err = repo
        .random_puzzle(DatabaseId::new(42), range, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let err = repo.rating_bounds(DatabaseId::new(42)).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_empty_database_has_no_bounds() {
    let repo = connect("memdb_empty").await;
    let db = repo.create_database("Empty").await.unwrap();

    let err = repo.rating_bounds(db).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
