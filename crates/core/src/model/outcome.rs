use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion state of a single puzzle attempt within a session.
///
/// Every attempt starts as `Incomplete` and may transition exactly once to
/// one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Completion {
    Incomplete,
    Correct,
    Incorrect,
    Skipped,
}

impl Completion {
    /// Returns true once the attempt has reached a terminal state.
    #[must_use]
    pub fn is_complete(self) -> bool {
        self != Completion::Incomplete
    }

    /// Normalize a completion into an outcome for history consumption.
    ///
    /// `Incomplete` attempts carry no outcome and are filtered out of the
    /// rolling performance window.
    #[must_use]
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Completion::Incomplete => None,
            Completion::Correct => Some(Outcome::Correct),
            Completion::Incorrect => Some(Outcome::Incorrect),
            Completion::Skipped => Some(Outcome::Skipped),
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Completion::Incomplete => "incomplete",
            Completion::Correct => "correct",
            Completion::Incorrect => "incorrect",
            Completion::Skipped => "skipped",
        };
        write!(f, "{label}")
    }
}

/// Classified result of a finished puzzle attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
    Skipped,
}

impl Outcome {
    /// The completion state this outcome corresponds to.
    #[must_use]
    pub fn completion(self) -> Completion {
        match self {
            Outcome::Correct => Completion::Correct,
            Outcome::Incorrect => Completion::Incorrect,
            Outcome::Skipped => Completion::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_has_no_outcome() {
        assert_eq!(Completion::Incomplete.outcome(), None);
        assert!(!Completion::Incomplete.is_complete());
    }

    #[test]
    fn terminal_states_classify() {
        assert_eq!(Completion::Correct.outcome(), Some(Outcome::Correct));
        assert_eq!(Completion::Incorrect.outcome(), Some(Outcome::Incorrect));
        assert_eq!(Completion::Skipped.outcome(), Some(Outcome::Skipped));
    }

    #[test]
    fn outcome_completion_round_trips() {
        for outcome in [Outcome::Correct, Outcome::Incorrect, Outcome::Skipped] {
            assert_eq!(outcome.completion().outcome(), Some(outcome));
        }
    }
}
