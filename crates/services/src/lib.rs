#![forbid(unsafe_code)]

pub mod error;
pub mod selector;
pub mod session;
pub mod trainer;

pub use error::{SelectorError, SessionError, TrainerError};
pub use selector::PuzzleSelector;
pub use session::{PuzzleSession, SessionEntry, SessionStats};
pub use trainer::{
    GenerationTicket, OutcomeEvent, PuzzleTrainer, TrainerConfig, TrainerState,
};
