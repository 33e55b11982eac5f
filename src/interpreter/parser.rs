/// Parser entry point.
///
/// Holds [`core::parse`], which turns a token stream into an [`crate::ast::Ast`]
/// plus diagnostics, and the top grammar rule.
pub mod core;

/// Prefix operators and atoms.
///
/// Handles negation, unary sign, literals with units, references, calls
/// and parenthesized groups.
pub mod unary;

/// Infix operators.
///
/// Implements the precedence levels of `||`, `&&`, comparisons and
/// left-associative `+`/`-`.
pub mod binary;

/// Parser state and recovery helpers.
///
/// Provides the token cursor shared by all grammar functions, diagnostic
/// reporting and resynchronization after a malformed argument.
pub mod utils;
