mod ids;
mod outcome;
mod puzzle;
mod range;

pub use ids::{DatabaseId, ParseIdError, PuzzleId};
pub use outcome::{Completion, Outcome};
pub use puzzle::{Puzzle, PuzzleError};
pub use range::{RangeError, RatingRange};
