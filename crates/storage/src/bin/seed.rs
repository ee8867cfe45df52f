use std::fmt;

use storage::repository::{NewPuzzle, PuzzleRepository};
use storage::sqlite::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    title: String,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("PUZZLE_DB_URL").unwrap_or_else(|_| "sqlite:puzzles.sqlite3".into());
        let mut title = "Sample Tactics".to_string();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let raw = require_value(&mut args, "--db")?;
                    if raw.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw });
                    }
                    db_url = raw;
                }
                "--title" => {
                    title = require_value(&mut args, "--title")?;
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self { db_url, title })
    }
}

fn sample_puzzles() -> Vec<NewPuzzle> {
    let rows: &[(&str, &str, i32)] = &[
        // back-rank mate
        ("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1", "d1d8", 800),
        // smothered mate pattern
        (
            "5r1k/6pp/7N/8/8/8/8/6QK w - - 0 1",
            "g1g8 f8g8 h6f7",
            1450,
        ),
        // queen fork of king and rook
        ("r5k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1", "e1e8 g8h7 e8a8", 1100),
        // knight fork
        ("4r1k1/pp3ppp/8/3N4/8/8/PP3PPP/6K1 w - - 0 1", "d5f6 g8f8 f6e8", 1250),
        // deflection to win the queen
        (
            "2r3k1/5ppp/8/8/q7/8/1B3PPP/1R4K1 w - - 0 1",
            "b1b8 c8b8 b2a4",
            1700,
        ),
        // skewer along the long diagonal
        ("6k1/6pp/8/3q4/8/1B6/6PP/6K1 w - - 0 1", "b3d5", 1350),
        // promotion breakthrough
        ("8/5kPp/8/8/8/8/7K/8 w - - 0 1", "g7g8q", 950),
        // rook lift mating net
        (
            "5rk1/5ppp/8/8/8/7R/5PPP/6K1 w - - 0 1",
            "h3h8 g8h8 h2h3",
            2000,
        ),
    ];

    rows.iter()
        .map(|(fen, moves, rating)| NewPuzzle {
            fen: (*fen).to_string(),
            moves: moves.split_whitespace().map(str::to_owned).collect(),
            rating: *rating,
        })
        .collect()
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;

    let db = repo.create_database(&args.title).await?;
    let puzzles = sample_puzzles();
    let ids = repo.insert_puzzles(db, &puzzles).await?;

    println!(
        "seeded database {db} ({title}) with {count} puzzles",
        title = args.title,
        count = ids.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("seed: {err}");
            eprintln!("usage: seed [--db sqlite:URL] [--title NAME]");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(args).await {
        eprintln!("seed: {err}");
        std::process::exit(1);
    }
}
