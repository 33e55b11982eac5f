/// Tree walk and identifier resolution.
///
/// Holds [`core::validate`] and [`core::validate_named`], which check a
/// compiled formula against a registry snapshot and collect semantic
/// diagnostics.
pub mod core;

/// Per-function argument contracts: arity, directions, bases and angle
/// ranges.
pub mod arguments;

/// Kind rules for arithmetic, comparison and logical operators.
pub mod units;
