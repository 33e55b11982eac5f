/// Numeric conversion helpers.
///
/// Safe conversions between `f64`, `i64` and [`chrono::TimeDelta`] without
/// silent overflow. Every helper returns `None` when the value is not finite
/// or does not fit the target type.
pub mod num;
