use std::fmt;

/// How serious a diagnostic is.
///
/// Any error rejects the formula; warnings are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The formula is accepted but probably not what was meant.
    Warning,
    /// The formula is rejected.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Self::Warning => "warning",
                        Self::Error => "error",
                    })
    }
}

/// Compilation phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Raised by the lexer.
    Lexical,
    /// Raised by the parser.
    Syntax,
    /// Raised by the validator.
    Semantic,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A character that starts no token, or an unterminated comment.
    UnexpectedCharacter,
    /// A token that does not fit the grammar at its position.
    UnexpectedToken,
    /// A call whose closing parenthesis is missing.
    UnterminatedCall,
    /// Parentheses, calls or operators nested too deeply to process.
    NestingTooDeep,
    /// A call to a name that is not a function.
    UnknownFunction,
    /// A call with the wrong number of arguments.
    ArityMismatch,
    /// `@name` where no formula `name` exists.
    UnknownReference,
    /// Operands whose units cannot be combined.
    UnitMismatch,
    /// A bare name that means nothing.
    UnknownIdentifier,
    /// An argument of the wrong sort, or a literal out of range.
    InvalidArgument,
    /// A reference chain that leads back to the formula being checked.
    CircularReference,
    /// A literal that is legal but unusual enough to be a mistake.
    SuspiciousValue,
}

impl DiagnosticKind {
    /// The phase that raises this kind.
    #[must_use]
    pub const fn stage(self) -> Stage {
        match self {
            Self::UnexpectedCharacter => Stage::Lexical,
            Self::UnexpectedToken | Self::UnterminatedCall | Self::NestingTooDeep => Stage::Syntax,
            _ => Stage::Semantic,
        }
    }
}

/// A message about a formula, anchored at a byte offset of its source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// Byte offset into the formula source.
    pub offset:   usize,
    /// Whether the diagnostic rejects the formula.
    pub severity: Severity,
    /// What went wrong.
    pub kind:     DiagnosticKind,
    /// Human-readable explanation.
    pub message:  String,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    #[must_use]
    pub fn error(kind: DiagnosticKind, offset: usize, message: impl Into<String>) -> Self {
        Self { offset,
               severity: Severity::Error,
               kind,
               message: message.into() }
    }

    /// Creates a warning diagnostic.
    #[must_use]
    pub fn warning(kind: DiagnosticKind, offset: usize, message: impl Into<String>) -> Self {
        Self { offset,
               severity: Severity::Warning,
               kind,
               message: message.into() }
    }

    /// Whether this diagnostic rejects the formula.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Formats the diagnostic under the offending line of `source`, with a
    /// caret under the reported column.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::error::{Diagnostic, DiagnosticKind};
    ///
    /// let diagnostic = Diagnostic::error(DiagnosticKind::UnknownIdentifier, 8, "unknown name `sunrse`");
    /// let rendered = diagnostic.render("72min + sunrse");
    ///
    /// assert_eq!(rendered,
    ///            "error: unknown name `sunrse`\n  |\n1 | 72min + sunrse\n  |         ^");
    /// ```
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let offset = floor_char_boundary(source, self.offset);
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
        let line_number = source[..line_start].matches('\n').count() + 1;
        let column = source[line_start..offset].chars().count();
        let gutter = " ".repeat(line_number.to_string().len());

        format!("{}: {}\n{gutter} |\n{line_number} | {}\n{gutter} | {}^",
                self.severity,
                self.message,
                &source[line_start..line_end],
                " ".repeat(column))
    }
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.offset, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_points_into_later_lines() {
        let diagnostic = Diagnostic::warning(DiagnosticKind::SuspiciousValue, 14, "odd");
        let rendered = diagnostic.render("coalesce(\n  sunrise, 99)");
        assert_eq!(rendered, "warning: odd\n  |\n2 |   sunrise, 99)\n  |     ^");
    }

    #[test]
    fn render_clamps_offsets_past_the_end() {
        let diagnostic = Diagnostic::error(DiagnosticKind::UnterminatedCall, 40, "missing `)`");
        assert!(diagnostic.render("solar(16.1").ends_with("          ^"));
    }

    #[test]
    fn kinds_know_their_stage() {
        assert_eq!(DiagnosticKind::UnexpectedCharacter.stage(), Stage::Lexical);
        assert_eq!(DiagnosticKind::UnterminatedCall.stage(), Stage::Syntax);
        assert_eq!(DiagnosticKind::CircularReference.stage(), Stage::Semantic);
    }
}
