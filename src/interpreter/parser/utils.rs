use std::{iter::Peekable, slice::Iter};

use crate::{
    ast::{AstBuilder, Expr, NodeId},
    error::{Diagnostic, DiagnosticKind},
    interpreter::lexer::{Token, TokenKind},
};

/// Deepest nesting of groups, call arguments and prefix operators the
/// parser follows, and the tallest tree it builds.
pub const MAX_NESTING: usize = 256;

/// Parser state threaded through the grammar functions.
///
/// Holds the token cursor, the node arena being built and the diagnostics
/// collected so far. The end-of-input token is never consumed.
pub struct ParseState<'t> {
    tokens:                 Peekable<Iter<'t, Token>>,
    end:                    usize,
    /// Grammar levels currently entered through [`ParseState::nested`].
    depth:                  usize,
    /// Parentheses currently open, of groups and calls.
    open:                   usize,
    too_deep:               bool,
    pub(crate) arena:       AstBuilder,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<'t> ParseState<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        let end = tokens.last().map_or(0, |t| t.offset + t.lexeme.len());
        Self { tokens: tokens.iter().peekable(),
               end,
               depth: 0,
               open: 0,
               too_deep: false,
               arena: AstBuilder::default(),
               diagnostics: Vec::new() }
    }

    /// Runs `parse` one level deeper.
    ///
    /// Past [`MAX_NESTING`] levels the rest of the enclosing group is
    /// skipped and an error marker takes its place.
    pub(crate) fn nested(&mut self, parse: impl FnOnce(&mut Self) -> NodeId) -> NodeId {
        if self.depth >= MAX_NESTING {
            let offset = self.offset();
            self.report_too_deep(offset);
            self.synchronize();
            return self.push(Expr::Error { offset });
        }

        self.depth += 1;
        let id = parse(self);
        self.depth -= 1;
        id
    }

    /// Runs `parse` inside a pair of parentheses.
    pub(crate) fn enclosed(&mut self, parse: impl FnOnce(&mut Self) -> NodeId) -> NodeId {
        self.open += 1;
        let id = self.nested(parse);
        self.open -= 1;
        id
    }

    /// Whether a `)` or `,` would close or separate something right now.
    pub(crate) const fn inside_parentheses(&self) -> bool {
        self.open > 0
    }

    fn report_too_deep(&mut self, offset: usize) {
        if !self.too_deep {
            self.too_deep = true;
            self.error(DiagnosticKind::NestingTooDeep,
                       offset,
                       format!("formula nests deeper than {MAX_NESTING} levels"));
        }
    }

    /// The next token, or `None` at end of input.
    pub(crate) fn peek(&mut self) -> Option<&'t Token> {
        self.tokens.peek().copied().filter(|t| t.kind != TokenKind::EndOfInput)
    }

    /// Kind of the next token.
    pub(crate) fn peek_kind(&mut self) -> TokenKind {
        self.peek().map_or(TokenKind::EndOfInput, |t| t.kind)
    }

    /// Byte offset of the next token, or of the end of input.
    pub(crate) fn offset(&mut self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    /// Consumes the next token. Returns `None` at end of input.
    pub(crate) fn advance(&mut self) -> Option<&'t Token> {
        self.peek()?;
        self.tokens.next()
    }

    /// Consumes the next token if it has the given kind.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.tokens.next();
            true
        } else {
            false
        }
    }

    /// Appends a node. A node that would make the tree taller than
    /// [`MAX_NESTING`] is replaced by an error marker.
    pub(crate) fn push(&mut self, expr: Expr) -> NodeId {
        let offset = expr.offset();
        let id = self.arena.push(expr);
        if self.arena.height(id) <= MAX_NESTING {
            return id;
        }
        self.report_too_deep(offset);
        self.arena.push(Expr::Error { offset })
    }

    pub(crate) fn error(&mut self, kind: DiagnosticKind, offset: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(kind, offset, message));
    }

    /// Reports the next token as unexpected and returns its offset.
    pub(crate) fn report_unexpected(&mut self, expected: &str) -> usize {
        let offset = self.offset();
        let found = self.peek().map_or_else(|| "end of formula".to_string(), describe);
        self.error(DiagnosticKind::UnexpectedToken,
                   offset,
                   format!("expected {expected}, found {found}"));
        offset
    }

    /// Skips tokens up to the next `,` or `)` at the current nesting level,
    /// leaving that token unconsumed.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::EndOfInput => return,
                TokenKind::Comma | TokenKind::RParen if depth == 0 => return,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {},
            }
            self.tokens.next();
        }
    }
}

/// Describes a token for diagnostics.
pub fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::EndOfInput => "end of formula".to_string(),
        TokenKind::Number(_) => format!("number `{}`", token.lexeme),
        TokenKind::Identifier | TokenKind::FunctionName(_) => format!("name `{}`", token.lexeme),
        TokenKind::UnitSuffix(_) => format!("unit `{}`", token.lexeme),
        TokenKind::Reference => format!("reference `{}`", token.lexeme),
        _ => format!("`{}`", token.lexeme),
    }
}
