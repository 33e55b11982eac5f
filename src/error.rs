/// Compile-time diagnostics.
///
/// Lexer, parser and validator findings share one shape: a byte offset into
/// the formula, a severity, a kind and a message. Any error-level diagnostic
/// rejects the formula.
pub mod diagnostic;
/// Evaluation failures.
///
/// Every reason a valid formula can fail to yield a time on a given day and
/// location, from unreachable solar angles to exhausted step budgets.
pub mod eval_error;

pub use diagnostic::{Diagnostic, DiagnosticKind, Severity, Stage};
pub use eval_error::EvalError;
