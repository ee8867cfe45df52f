use serde::{Deserialize, Serialize};

use crate::model::{Outcome, RatingRange};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

const DEFAULT_WINDOW: usize = 10;
const DEFAULT_STEP: i32 = 25;
const DEFAULT_MIN_HALF_WIDTH: i32 = 75;
const DEFAULT_MAX_HALF_WIDTH: i32 = 200;

/// Tuning knobs for the adaptive difficulty window.
///
/// # Fields
///
/// * `window` - How many recent outcomes feed the calculation (older ones are ignored)
/// * `step` - Rating points the window center moves per net outcome
/// * `min_half_width` - Narrowest half-width, reached when recent results are fully consistent
/// * `max_half_width` - Widest half-width, used for short or mixed histories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    pub window: usize,
    pub step: i32,
    pub min_half_width: i32,
    pub max_half_width: i32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            step: DEFAULT_STEP,
            min_half_width: DEFAULT_MIN_HALF_WIDTH,
            max_half_width: DEFAULT_MAX_HALF_WIDTH,
        }
    }
}

//
// ─── ADAPTIVE RANGE ────────────────────────────────────────────────────────────
//

/// Propose a target difficulty window from the player rating and recent
/// outcome history (most-recent-last).
///
/// The center shifts up when history skews correct (the player is
/// under-challenged) and down when it skews incorrect; skips count against,
/// since skipping reads as a too-hard signal. The window narrows as recent
/// results become consistent and stays wide while history is short or mixed.
///
/// With no history at all this falls back to `player_rating ±
/// max_half_width`, so the result is always usable. Callers are expected to
/// clamp the proposal to the active database bounds afterwards; this
/// function never fails and never returns an inverted range.
///
/// # Examples
///
/// ```
/// # use puzzle_core::adaptive::{adaptive_range, AdaptiveConfig};
/// # use puzzle_core::model::Outcome;
/// let config = AdaptiveConfig::default();
/// let streak = vec![Outcome::Correct; 10];
/// let range = adaptive_range(1500, &streak, &config);
/// assert!(range.midpoint() > 1500);
/// ```
#[must_use]
pub fn adaptive_range(player_rating: i32, recent: &[Outcome], config: &AdaptiveConfig) -> RatingRange {
    let window = config.window.max(1);
    let min_half = config.min_half_width.min(config.max_half_width).max(0);
    let max_half = config.max_half_width.max(min_half);

    let start = recent.len().saturating_sub(window);
    let recent = &recent[start..];

    if recent.is_empty() {
        return RatingRange::around(player_rating, max_half);
    }

    let net: i32 = recent
        .iter()
        .map(|outcome| match outcome {
            Outcome::Correct => 1,
            Outcome::Incorrect | Outcome::Skipped => -1,
        })
        .sum();

    let center = player_rating.saturating_add(net.saturating_mul(config.step));

    // |net| / window is the consistency of the recent record: a full window
    // of identical results narrows the window to min_half, anything mixed
    // (or short) keeps it proportionally wider.
    let span = i64::from(max_half - min_half);
    let shrink = span * i64::from(net.unsigned_abs().min(window as u32) as i32) / window as i64;
    #[allow(clippy::cast_possible_truncation)]
    let half = max_half - shrink as i32;

    RatingRange::around(center, half)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(pattern: &[(Outcome, usize)]) -> Vec<Outcome> {
        let mut out = Vec::new();
        for (outcome, count) in pattern {
            out.extend(std::iter::repeat_n(*outcome, *count));
        }
        out
    }

    #[test]
    fn empty_history_centers_on_player_rating() {
        let range = adaptive_range(1200, &[], &AdaptiveConfig::default());
        assert!(range.contains(1200));
        assert_eq!(range.midpoint(), 1200);
        assert_eq!(range.width(), 2 * DEFAULT_MAX_HALF_WIDTH);
    }

    #[test]
    fn full_correct_streak_raises_midpoint() {
        let history = outcomes(&[(Outcome::Correct, 10)]);
        let range = adaptive_range(1500, &history, &AdaptiveConfig::default());
        assert!(range.midpoint() > 1500);
    }

    #[test]
    fn full_incorrect_streak_lowers_midpoint() {
        let history = outcomes(&[(Outcome::Incorrect, 10)]);
        let range = adaptive_range(1500, &history, &AdaptiveConfig::default());
        assert!(range.midpoint() < 1500);
    }

    #[test]
    fn skips_count_as_failures_for_centering() {
        let history = outcomes(&[(Outcome::Skipped, 10)]);
        let range = adaptive_range(1500, &history, &AdaptiveConfig::default());
        assert!(range.midpoint() < 1500);
    }

    #[test]
    fn consistent_history_narrows_the_window() {
        let config = AdaptiveConfig::default();
        let mixed = outcomes(&[(Outcome::Correct, 5), (Outcome::Incorrect, 5)]);
        let streak = outcomes(&[(Outcome::Correct, 10)]);

        let wide = adaptive_range(1500, &mixed, &config);
        let narrow = adaptive_range(1500, &streak, &config);

        assert!(narrow.width() < wide.width());
        assert_eq!(narrow.width(), 2 * config.min_half_width);
        assert_eq!(wide.width(), 2 * config.max_half_width);
    }

    #[test]
    fn short_history_stays_wide() {
        let config = AdaptiveConfig::default();
        let short = outcomes(&[(Outcome::Correct, 2)]);
        let range = adaptive_range(1500, &short, &config);

        // Two net-correct results shift the center a little and shave only a
        // fifth of the width span.
        assert_eq!(range.midpoint(), 1500 + 2 * config.step);
        assert!(range.width() > 2 * config.min_half_width);
    }

    #[test]
    fn only_the_trailing_window_counts() {
        let config = AdaptiveConfig::default();
        let mut history = outcomes(&[(Outcome::Incorrect, 20)]);
        history.extend(outcomes(&[(Outcome::Correct, 10)]));

        let range = adaptive_range(1500, &history, &config);
        assert!(range.midpoint() > 1500);
    }

    #[test]
    fn monotone_in_net_score() {
        let config = AdaptiveConfig::default();
        let mut previous = None;
        for correct in 0..=10 {
            let history = outcomes(&[
                (Outcome::Correct, correct),
                (Outcome::Incorrect, 10 - correct),
            ]);
            let midpoint = adaptive_range(1500, &history, &config).midpoint();
            if let Some(prev) = previous {
                assert!(midpoint >= prev, "midpoint regressed at {correct} correct");
            }
            previous = Some(midpoint);
        }
    }

    #[test]
    fn clamped_result_respects_database_bounds() {
        let config = AdaptiveConfig::default();
        let bounds = RatingRange::new(800, 1600).unwrap();
        let history = outcomes(&[(Outcome::Correct, 10)]);

        let clamped = adaptive_range(1500, &history, &config).clamp_to(bounds);
        assert!(bounds.min() <= clamped.min());
        assert!(clamped.min() <= clamped.max());
        assert!(clamped.max() <= bounds.max());
    }

    #[test]
    fn degenerate_bounds_pin_the_window() {
        let config = AdaptiveConfig::default();
        let bounds = RatingRange::single(1400);
        let history = outcomes(&[(Outcome::Correct, 10)]);

        let clamped = adaptive_range(1500, &history, &config).clamp_to(bounds);
        assert_eq!(clamped, RatingRange::single(1400));
    }

    #[test]
    fn zero_window_is_treated_as_one() {
        let config = AdaptiveConfig {
            window: 0,
            ..AdaptiveConfig::default()
        };
        let history = outcomes(&[(Outcome::Correct, 3)]);
        let range = adaptive_range(1500, &history, &config);
        assert_eq!(range.midpoint(), 1500 + config.step);
    }
}
