/// Call dispatch and keyword arguments.
///
/// Matches each [`crate::interpreter::symbols::Function`] to its
/// implementation and reads direction and base keywords.
pub mod core;

/// `solar` and `seasonal_solar`.
///
/// Instants at which the sun crosses a depression angle, either fixed or
/// scaled by the season.
pub mod solar;

/// `proportional_hours`, `proportional_minutes` and `midpoint`.
///
/// Divide a day between two reference instants into equal parts.
pub mod proportional;

/// `coalesce`, `min`, `max` and `if`.
///
/// The combinators that tolerate failing operands.
pub mod combinators;
