use chrono::TimeDelta;

/// Largest integer value exactly representable as an `f64` (`2^53 - 1`).
pub const MAX_SAFE_U64_INT: u64 = 9_007_199_254_740_991;

/// Milliseconds in one minute.
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Safely converts an `i64` to `f64` if and only if it is exactly
/// representable.
///
/// ## Example
/// ```
/// use zmanim_dsl::util::num::{MAX_SAFE_U64_INT, i64_to_f64_checked};
///
/// assert_eq!(i64_to_f64_checked(42), Some(42.0));
///
/// let big = MAX_SAFE_U64_INT as i64 + 1;
/// assert_eq!(i64_to_f64_checked(big), None);
/// ```
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub const fn i64_to_f64_checked(value: i64) -> Option<f64> {
    if value.unsigned_abs() > MAX_SAFE_U64_INT {
        return None;
    }
    Some(value as f64)
}

/// Rounds an `f64` to the nearest `i64`, rejecting non-finite and
/// out-of-range values.
///
/// ## Example
/// ```
/// use zmanim_dsl::util::num::f64_to_i64_rounded;
///
/// assert_eq!(f64_to_i64_rounded(1.5), Some(2));
/// assert_eq!(f64_to_i64_rounded(-0.4), Some(0));
/// assert_eq!(f64_to_i64_rounded(f64::NAN), None);
/// assert_eq!(f64_to_i64_rounded(1e20), None);
/// ```
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn f64_to_i64_rounded(value: f64) -> Option<i64> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}

/// Converts a fractional number of minutes to a [`TimeDelta`] with
/// millisecond precision.
///
/// ## Example
/// ```
/// use chrono::TimeDelta;
/// use zmanim_dsl::util::num::minutes_to_delta;
///
/// assert_eq!(minutes_to_delta(1.5), TimeDelta::try_seconds(90));
/// assert_eq!(minutes_to_delta(f64::INFINITY), None);
/// ```
#[must_use]
pub fn minutes_to_delta(minutes: f64) -> Option<TimeDelta> {
    TimeDelta::try_milliseconds(f64_to_i64_rounded(minutes * MILLIS_PER_MINUTE)?)
}

/// Length of `delta` in fractional minutes.
#[must_use]
pub fn delta_to_minutes(delta: TimeDelta) -> Option<f64> {
    Some(i64_to_f64_checked(delta.num_milliseconds())? / MILLIS_PER_MINUTE)
}

/// Multiplies `delta` by `factor`, keeping millisecond precision.
///
/// ## Example
/// ```
/// use chrono::TimeDelta;
/// use zmanim_dsl::util::num::scale_delta;
///
/// let twelve_hours = TimeDelta::try_hours(12).unwrap();
/// assert_eq!(scale_delta(twelve_hours, 0.25), TimeDelta::try_hours(3));
/// ```
#[must_use]
pub fn scale_delta(delta: TimeDelta, factor: f64) -> Option<TimeDelta> {
    minutes_to_delta(delta_to_minutes(delta)? * factor)
}
