use std::fmt;

use puzzle_core::model::{Completion, Outcome, Puzzle};

use crate::error::SessionError;

//
// ─── SESSION ENTRY ─────────────────────────────────────────────────────────────
//

/// A puzzle attempted during the current session, with its completion state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    puzzle: Puzzle,
    completion: Completion,
}

impl SessionEntry {
    fn new(puzzle: Puzzle) -> Self {
        Self {
            puzzle,
            completion: Completion::Incomplete,
        }
    }

    #[must_use]
    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    #[must_use]
    pub fn completion(&self) -> Completion {
        self.completion
    }
}

/// Per-outcome counts over a session, for UI summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
    pub incomplete: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory history of the puzzles attempted in the current session.
///
/// History is append-only: new attempts go on the end, and only the trailing
/// attempt may move out of `Incomplete`. The cursor exists so a UI can step
/// back through earlier puzzles without touching statistics.
///
/// Not persisted across restarts; lifecycle is reset/database-change bound.
#[derive(Clone, Default)]
pub struct PuzzleSession {
    entries: Vec<SessionEntry>,
    current: Option<usize>,
}

impl PuzzleSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn current_entry(&self) -> Option<&SessionEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    /// Append a freshly generated puzzle; it becomes the current attempt.
    pub fn add_puzzle(&mut self, puzzle: Puzzle) -> &SessionEntry {
        self.entries.push(SessionEntry::new(puzzle));
        let index = self.entries.len() - 1;
        self.current = Some(index);
        &self.entries[index]
    }

    /// Complete the current attempt with the given outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentPuzzle` for an empty session,
    /// `SessionError::NotCurrentAttempt` when the cursor has been moved back
    /// onto an earlier puzzle, and `SessionError::AlreadyCompleted` when the
    /// trailing attempt has already been completed.
    pub fn change_completion(&mut self, outcome: Outcome) -> Result<&SessionEntry, SessionError> {
        let index = self.current.ok_or(SessionError::NoCurrentPuzzle)?;
        if index + 1 != self.entries.len() {
            return Err(SessionError::NotCurrentAttempt);
        }

        let entry = &mut self.entries[index];
        if entry.completion.is_complete() {
            return Err(SessionError::AlreadyCompleted);
        }

        entry.completion = outcome.completion();
        Ok(&self.entries[index])
    }

    /// Move the cursor onto an earlier attempt without mutating history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::OutOfBounds` for an invalid index.
    pub fn select_puzzle(&mut self, index: usize) -> Result<&SessionEntry, SessionError> {
        if index >= self.entries.len() {
            return Err(SessionError::OutOfBounds {
                index,
                len: self.entries.len(),
            });
        }
        self.current = Some(index);
        Ok(&self.entries[index])
    }

    /// Drop all history and reset the cursor. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }

    /// The classified outcomes of completed attempts, oldest first, truncated
    /// to the trailing `limit`. This is the rolling window the adaptive range
    /// calculator consumes.
    #[must_use]
    pub fn recent_outcomes(&self, limit: usize) -> Vec<Outcome> {
        let completed: Vec<Outcome> = self
            .entries
            .iter()
            .filter_map(|entry| entry.completion().outcome())
            .collect();
        let start = completed.len().saturating_sub(limit);
        completed[start..].to_vec()
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let mut stats = SessionStats::default();
        for entry in &self.entries {
            match entry.completion() {
                Completion::Correct => stats.correct += 1,
                Completion::Incorrect => stats.incorrect += 1,
                Completion::Skipped => stats.skipped += 1,
                Completion::Incomplete => stats.incomplete += 1,
            }
        }
        stats
    }
}

impl fmt::Debug for PuzzleSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleSession")
            .field("entries_len", &self.entries.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
