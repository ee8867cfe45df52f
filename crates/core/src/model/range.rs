use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RangeError {
    #[error("rating range is inverted: {min} > {max}")]
    Inverted { min: i32, max: i32 },
}

/// An inclusive rating window, `min <= max` by construction.
///
/// Used both for the fixed bounds of a puzzle database and for the active
/// selection window. Clamping preserves the ordering invariant, so an
/// inverted range cannot be observed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRange {
    min: i32,
    max: i32,
}

impl RatingRange {
    /// Build a range from explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns `RangeError::Inverted` if `min > max`.
    pub fn new(min: i32, max: i32) -> Result<Self, RangeError> {
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// A window of `center ± half_width`. Negative half-widths collapse to
    /// the single rating `center`.
    #[must_use]
    pub fn around(center: i32, half_width: i32) -> Self {
        let half = half_width.max(0);
        Self {
            min: center.saturating_sub(half),
            max: center.saturating_add(half),
        }
    }

    /// The degenerate range containing exactly one rating.
    #[must_use]
    pub fn single(rating: i32) -> Self {
        Self {
            min: rating,
            max: rating,
        }
    }

    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    #[must_use]
    pub fn contains(&self, rating: i32) -> bool {
        self.min <= rating && rating <= self.max
    }

    /// The span of the range, saturating for pathological bounds that do
    /// not fit in `i32`.
    #[must_use]
    pub fn width(&self) -> i32 {
        let span = i64::from(self.max) - i64::from(self.min);
        i32::try_from(span).unwrap_or(i32::MAX)
    }

    #[must_use]
    pub fn midpoint(&self) -> i32 {
        // The average of two i32 values always fits back in i32.
        #[allow(clippy::cast_possible_truncation)]
        let mid = (i64::from(self.min) + i64::from(self.max)) / 2;
        mid as i32
    }

    /// True when the range admits a single rating only.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Clamp both ends independently into `bounds`.
    ///
    /// Clamping is monotone, so the result stays ordered even when this
    /// range lies entirely outside `bounds` (it collapses onto the nearer
    /// bound).
    #[must_use]
    pub fn clamp_to(&self, bounds: RatingRange) -> Self {
        Self {
            min: self.min.clamp(bounds.min, bounds.max),
            max: self.max.clamp(bounds.min, bounds.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_inverted_bounds() {
        assert!(RatingRange::new(1500, 1200).is_err());
        assert!(RatingRange::new(1200, 1200).is_ok());
    }

    #[test]
    fn around_is_symmetric() {
        let range = RatingRange::around(1500, 100);
        assert_eq!(range.min(), 1400);
        assert_eq!(range.max(), 1600);
        assert_eq!(range.midpoint(), 1500);
    }

    #[test]
    fn around_collapses_negative_half_width() {
        let range = RatingRange::around(1500, -10);
        assert!(range.is_degenerate());
        assert_eq!(range.min(), 1500);
    }

    #[test]
    fn clamp_keeps_order_inside_bounds() {
        let bounds = RatingRange::new(1000, 2000).unwrap();
        let clamped = RatingRange::around(2100, 200).clamp_to(bounds);
        assert_eq!(clamped.min(), 1900);
        assert_eq!(clamped.max(), 2000);
        assert!(clamped.min() <= clamped.max());
    }

    #[test]
    fn clamp_collapses_when_fully_outside() {
        let bounds = RatingRange::new(1000, 2000).unwrap();
        let clamped = RatingRange::around(3000, 100).clamp_to(bounds);
        assert_eq!(clamped, RatingRange::single(2000));
    }

    #[test]
    fn clamp_to_degenerate_bounds_pins_to_single_rating() {
        let bounds = RatingRange::single(1500);
        let clamped = RatingRange::around(1200, 300).clamp_to(bounds);
        assert_eq!(clamped, RatingRange::single(1500));
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        let range = RatingRange::new(i32::MIN, i32::MAX).unwrap();
        assert_eq!(range.width(), i32::MAX);
        assert_eq!(range.midpoint(), 0);
        assert!(range.contains(0));
    }

    #[test]
    fn contains_is_inclusive() {
        let range = RatingRange::new(1000, 1100).unwrap();
        assert!(range.contains(1000));
        assert!(range.contains(1100));
        assert!(!range.contains(999));
        assert!(!range.contains(1101));
    }
}
