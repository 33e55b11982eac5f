/// The evaluator module walks formula trees and computes times.
///
/// The evaluator resolves references against a registry snapshot, computes
/// astronomical primitives, applies unit-aware arithmetic and runs the
/// combinators that degrade gracefully when an event does not occur.
///
/// # Responsibilities
/// - Evaluates every node kind to a runtime value or a typed failure.
/// - Detects reference cycles and enforces the step budget.
/// - Binds final results to the calculation date.
pub mod evaluator;
/// The lexer module tokenizes formula source.
///
/// The lexer reads the raw source text and produces a stream of classified
/// tokens: numbers, unit suffixes, names, references, operators and
/// delimiters. This is the first stage of compilation.
///
/// # Responsibilities
/// - Converts the input into tokens with kind, lexeme and byte offset.
/// - Normalizes unit suffixes written with or without a space.
/// - Reports lexical errors and keeps scanning past them.
pub mod lexer;
/// The parser module builds the syntax tree from tokens.
///
/// # Responsibilities
/// - Converts tokens into [`crate::ast::Expr`] nodes in an arena.
/// - Reports syntax errors with source offsets.
/// - Recovers at argument boundaries so sibling arguments are still parsed.
pub mod parser;
/// Tables of the functions and keywords the language knows.
pub mod symbols;
/// The validator module checks compiled formulas without running them.
///
/// # Responsibilities
/// - Enforces function arity and argument contracts.
/// - Resolves references against a registry snapshot.
/// - Tracks value kinds to catch unit mismatches.
pub mod validator;
/// The value module defines runtime values and results.
///
/// # Responsibilities
/// - Defines the `Value` enum and the static `ValueKind` lattice.
/// - Defines [`value::zman_time::ZmanTime`], a local time of day on the
///   calculation date.
pub mod value;
