/// Core evaluation logic.
///
/// Contains the [`core::Evaluator`], the node dispatch, the step budget, the
/// breakdown trace and the result window check.
pub mod core;

/// Arithmetic, comparison and logical operators on runtime values.
pub mod arithmetic;

/// Bare identifiers: astronomical primitives and condition variables.
pub mod primitive;

/// `@name` resolution with cycle detection and per-evaluation reuse.
pub mod reference;

/// Function evaluation.
///
/// Dispatches calls to the astronomical, proportional-time and combinator
/// families.
pub mod function;
