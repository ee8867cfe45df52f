use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use puzzle_core::adaptive::{AdaptiveConfig, adaptive_range};
use puzzle_core::model::{DatabaseId, Outcome, Puzzle, PuzzleId, RatingRange};
use storage::repository::{DatabaseInfo, PuzzleRepository};

use crate::error::{SelectorError, TrainerError};
use crate::selector::PuzzleSelector;
use crate::session::{PuzzleSession, SessionEntry};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Puzzle training preferences, owned by the embedder and passed in
/// explicitly rather than read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Derive the rating window from recent results instead of the manual one.
    pub progressive: bool,
    /// Walk puzzles in stable id order instead of picking at random.
    pub in_order: bool,
    /// UI hint only; selection ignores it.
    pub hide_rating: bool,
    /// The player's own rating, the anchor for the adaptive window.
    pub player_rating: i32,
    pub adaptive: AdaptiveConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            progressive: false,
            in_order: false,
            hide_rating: false,
            player_rating: 1500,
            adaptive: AdaptiveConfig::default(),
        }
    }
}

//
// ─── STATE & EVENTS ────────────────────────────────────────────────────────────
//

/// Orchestrator lifecycle. Errors are surfaced to the caller and never leave
/// the trainer stuck: a failed generation returns to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    NoDatabase,
    Ready,
    Generating,
}

/// Fire-and-forget notification of a classified puzzle outcome, for a
/// persistence or statistics backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeEvent {
    pub database: DatabaseId,
    pub puzzle: PuzzleId,
    pub outcome: Outcome,
}

/// Snapshot of one generation request.
///
/// The token ties the request to the session it was issued for: database
/// switches and resets invalidate outstanding tickets, so a slow selector
/// result cannot land in the wrong session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    token: u64,
    database: DatabaseId,
    range: RatingRange,
    in_order: bool,
}

impl GenerationTicket {
    #[must_use]
    pub fn database(&self) -> DatabaseId {
        self.database
    }

    #[must_use]
    pub fn range(&self) -> RatingRange {
        self.range
    }

    #[must_use]
    pub fn in_order(&self) -> bool {
        self.in_order
    }
}

//
// ─── TRAINER ───────────────────────────────────────────────────────────────────
//

/// Orchestrates puzzle training: composes the session tracker, the selector,
/// and the adaptive window into the request flow a board UI drives.
///
/// Mutations are single-threaded and processed to completion; the only
/// suspend point is the selector's backend call, and at most one generation
/// may be outstanding. `generate` wraps that await; embedders that resolve
/// the backend call elsewhere can use `begin_generation` /
/// `finish_generation` directly and rely on the ticket to drop stale
/// results.
pub struct PuzzleTrainer {
    repo: Arc<dyn PuzzleRepository>,
    selector: PuzzleSelector,
    session: PuzzleSession,
    config: TrainerConfig,
    selected: Option<DatabaseId>,
    bounds: Option<RatingRange>,
    window: Option<RatingRange>,
    state: TrainerState,
    generation: u64,
    events: Option<Sender<OutcomeEvent>>,
}

impl PuzzleTrainer {
    #[must_use]
    pub fn new(repo: Arc<dyn PuzzleRepository>, config: TrainerConfig) -> Self {
        let selector = PuzzleSelector::new(Arc::clone(&repo));
        Self {
            repo,
            selector,
            session: PuzzleSession::new(),
            config,
            selected: None,
            bounds: None,
            window: None,
            state: TrainerState::NoDatabase,
            generation: 0,
            events: None,
        }
    }

    /// Attach a channel receiving classified outcomes (fire-and-forget).
    #[must_use]
    pub fn with_outcome_events(mut self, events: Sender<OutcomeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn state(&self) -> TrainerState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TrainerConfig {
        &mut self.config
    }

    #[must_use]
    pub fn session(&self) -> &PuzzleSession {
        &self.session
    }

    #[must_use]
    pub fn selected_database(&self) -> Option<DatabaseId> {
        self.selected
    }

    #[must_use]
    pub fn database_bounds(&self) -> Option<RatingRange> {
        self.bounds
    }

    /// The active selection window (manual or adaptive), clamped to bounds.
    #[must_use]
    pub fn rating_range(&self) -> Option<RatingRange> {
        self.window
    }

    #[must_use]
    pub fn current_puzzle(&self) -> Option<&Puzzle> {
        self.session.current_entry().map(SessionEntry::puzzle)
    }

    /// List the available puzzle databases.
    ///
    /// # Errors
    ///
    /// Returns `TrainerError::Storage` on backend failure.
    pub async fn list_databases(&self) -> Result<Vec<DatabaseInfo>, TrainerError> {
        Ok(self.repo.list_databases().await?)
    }

    /// Switch to a database: fetch its bounds, clear the session and the
    /// selector caches, and reset the window to the full bounds.
    ///
    /// Any in-flight generation for the previous database is invalidated.
    ///
    /// # Errors
    ///
    /// Returns `TrainerError::Selector` if the bounds cannot be fetched; the
    /// previous selection is left untouched in that case.
    pub async fn select_database(&mut self, db: DatabaseId) -> Result<(), TrainerError> {
        let bounds = self.selector.bounds(db).await?;

        if let Some(previous) = self.selected {
            self.selector.clear_cache(previous);
        }
        self.session.clear();
        self.selected = Some(db);
        self.bounds = Some(bounds);
        self.window = Some(bounds);
        self.state = TrainerState::Ready;
        self.generation += 1;

        debug!(%db, min = bounds.min(), max = bounds.max(), "database selected");
        Ok(())
    }

    /// Set the manual rating window, clamped to the database bounds.
    ///
    /// # Errors
    ///
    /// Returns `TrainerError::NoDatabaseSelected` before a database is
    /// selected.
    pub fn set_rating_range(&mut self, range: RatingRange) -> Result<(), TrainerError> {
        let bounds = self.bounds.ok_or(TrainerError::NoDatabaseSelected)?;
        self.window = Some(range.clamp_to(bounds));
        Ok(())
    }

    /// Clear the session, invalidate selector caches, and restore the window
    /// from the database bounds. Outstanding generations are invalidated.
    pub fn reset_session(&mut self) {
        self.session.clear();
        if let Some(db) = self.selected {
            self.selector.clear_cache(db);
            self.window = self.bounds;
            self.state = TrainerState::Ready;
        }
        self.generation += 1;
        debug!("session cleared");
    }

    /// Start a generation request: decide the active window (recomputing it
    /// in progressive mode) and move to `Generating`.
    ///
    /// # Errors
    ///
    /// Returns `TrainerError::NoDatabaseSelected` before a database is
    /// selected and `TrainerError::GenerationInFlight` while another request
    /// is outstanding.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket, TrainerError> {
        let database = self.selected.ok_or(TrainerError::NoDatabaseSelected)?;
        let bounds = self.bounds.ok_or(TrainerError::NoDatabaseSelected)?;
        if self.state == TrainerState::Generating {
            return Err(TrainerError::GenerationInFlight);
        }

        // With degenerate bounds there is only one rating to offer, so
        // progressive mode has nothing to adapt.
        if self.config.progressive && !bounds.is_degenerate() {
            let history = self.session.recent_outcomes(self.config.adaptive.window);
            let proposed =
                adaptive_range(self.config.player_rating, &history, &self.config.adaptive);
            let clamped = proposed.clamp_to(bounds);
            debug!(
                player_rating = self.config.player_rating,
                history_len = history.len(),
                proposed_min = proposed.min(),
                proposed_max = proposed.max(),
                min = clamped.min(),
                max = clamped.max(),
                "adaptive window recomputed"
            );
            self.window = Some(clamped);
        }

        let range = self.window.unwrap_or(bounds);
        self.state = TrainerState::Generating;

        debug!(
            %database,
            min = range.min(),
            max = range.max(),
            in_order = self.config.in_order,
            "generating puzzle"
        );

        Ok(GenerationTicket {
            token: self.generation,
            database,
            range,
            in_order: self.config.in_order,
        })
    }

    /// Apply the result of a generation request.
    ///
    /// Stale tickets (issued before a reset or database switch, or already
    /// resolved once) are discarded without touching the session. Each
    /// finish retires the token, so a duplicated ticket cannot be applied
    /// twice. Failures return the trainer to `Ready`; errors are not
    /// sticky.
    ///
    /// # Errors
    ///
    /// Returns `TrainerError::StaleGeneration` for an invalidated ticket, or
    /// the selector failure for the current one.
    pub fn finish_generation(
        &mut self,
        ticket: GenerationTicket,
        result: Result<Puzzle, SelectorError>,
    ) -> Result<&SessionEntry, TrainerError> {
        if self.state != TrainerState::Generating || ticket.token != self.generation {
            warn!(
                database = %ticket.database,
                "discarding stale generation result"
            );
            return Err(TrainerError::StaleGeneration);
        }

        self.state = TrainerState::Ready;
        self.generation += 1;
        let puzzle = result?;
        Ok(self.session.add_puzzle(puzzle))
    }

    /// Generate the next puzzle and append it to the session.
    ///
    /// # Errors
    ///
    /// See `begin_generation` and `finish_generation`; additionally
    /// surfaces `TrainerError::Selector` when the window matches no puzzle.
    pub async fn generate(&mut self) -> Result<&SessionEntry, TrainerError> {
        let ticket = self.begin_generation()?;
        let result = self
            .selector
            .next_puzzle(ticket.database, ticket.range, ticket.in_order)
            .await;
        self.finish_generation(ticket, result)
    }

    /// Complete the current attempt and emit the classified outcome.
    ///
    /// # Errors
    ///
    /// Returns `TrainerError::Session` when there is no current attempt or
    /// it was already completed.
    pub fn record_completion(&mut self, outcome: Outcome) -> Result<(), TrainerError> {
        let entry = self.session.change_completion(outcome)?;
        let puzzle = entry.puzzle().id();

        if let (Some(events), Some(database)) = (&self.events, self.selected) {
            // fire-and-forget: a closed receiver is not our problem
            let _ = events.send(OutcomeEvent {
                database,
                puzzle,
                outcome,
            });
        }

        debug!(%puzzle, ?outcome, "attempt completed");
        Ok(())
    }

    /// Move the session cursor onto an earlier attempt for review.
    ///
    /// # Errors
    ///
    /// Returns `TrainerError::Session` for an invalid index.
    pub fn select_puzzle(&mut self, index: usize) -> Result<&SessionEntry, TrainerError> {
        Ok(self.session.select_puzzle(index)?)
    }
}

impl fmt::Debug for PuzzleTrainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleTrainer")
            .field("state", &self.state)
            .field("selected", &self.selected)
            .field("bounds", &self.bounds)
            .field("window", &self.window)
            .field("session", &self.session)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
