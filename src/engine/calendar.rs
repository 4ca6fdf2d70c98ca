//! Business-day arithmetic for follow-up calls. All weekdays are UTC.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

/// Whether a business day has elapsed between `first` and `now`.
///
/// Steps forward from `first` one calendar day at a time, keeping the time of
/// day, for as long as the step is not after `now`. True at the first step
/// that lands Monday through Friday. A weekday is always reached within
/// three steps.
pub fn has_elapsed_business_day(first: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let mut step = first;
    for _ in 0..3 {
        step += Duration::days(1);
        if step > now {
            return false;
        }
        if is_weekday(step) {
            return true;
        }
    }
    false
}

fn is_weekday(at: DateTime<Utc>) -> bool {
    !matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}
