//! Session quality score.

use chrono::Duration;

use crate::config::ScoringConfig;

/// Score a completed session in `[0, 1]`.
///
/// Zero items score 0. At or under the target pace the raw score is one plus
/// a linear bonus; over it, the ratio of target to actual time.
pub fn score(config: &ScoringConfig, items: i64, elapsed: Duration) -> f64 {
    if items <= 0 {
        return 0.0;
    }

    let target = items as f64 * config.target_minutes_per_item;
    let actual = elapsed.num_milliseconds() as f64 / 60_000.0;

    let raw = if actual <= target {
        1.0 + (target - actual) / target * config.fast_bonus
    } else {
        target / actual
    };
    raw.clamp(0.0, 1.0)
}
