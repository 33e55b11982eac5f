use std::ops::Range;

use logos::{FilterResult, Lexer, Logos, Skip};
use ordered_float::OrderedFloat;

use crate::{
    ast::{MONTHS, Unit},
    error::{Diagnostic, DiagnosticKind},
    interpreter::symbols::Function,
};

/// Raw lexical token as recognized by logos.
///
/// Context-dependent classification (unit suffixes, function names) happens
/// afterwards in [`tokenize`].
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    /// Numeric literal tokens, such as `72`, `16.1` or `.5`.
    #[regex(r"[0-9]+(\.[0-9]+)?", parse_number)]
    #[regex(r"\.[0-9]+", parse_number)]
    Number(f64),
    /// A day of the year: `21-May`, `1-Jan`.
    #[regex(r"[0-9][0-9]?-(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)", parse_month_day)]
    MonthDay((u32, u32)),
    /// Names of primitives, directions, bases, functions and units.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    /// `@name`
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Reference,
    /// `// comment`
    #[token("//", skip_line_comment)]
    LineComment,
    /// ```text
    /// /* comment */
    /// ```
    #[token("/*", skip_block_comment)]
    BlockComment,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `,`
    #[token(",")]
    Comma,
    /// `<`
    #[token("<")]
    Less,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>`
    #[token(">")]
    Greater,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `!`
    #[token("!")]
    Bang,
}

fn parse_number(lex: &mut Lexer<RawToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_month_day(lex: &mut Lexer<RawToken>) -> Option<(u32, u32)> {
    let (day, month) = lex.slice().split_once('-')?;
    let month = MONTHS.iter().position(|name| *name == month)?;
    Some((u32::try_from(month).ok()? + 1, day.parse().ok()?))
}

fn skip_line_comment(lex: &mut Lexer<RawToken>) -> Skip {
    let rest = lex.remainder();
    lex.bump(rest.find('\n').unwrap_or(rest.len()));
    Skip
}

fn skip_block_comment(lex: &mut Lexer<RawToken>) -> FilterResult<(), ()> {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        },
        None => {
            lex.bump(rest.len());
            FilterResult::Error(())
        },
    }
}

/// Kind of a classified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A bare name that is not a function call or unit.
    Identifier,
    /// A known function name directly followed by `(`.
    FunctionName(Function),
    /// A numeric literal.
    Number(OrderedFloat<f64>),
    /// A day-of-year literal such as `21-May`.
    MonthDay {
        /// Month, 1 to 12.
        month: u32,
        /// Day of the month as written.
        day:   u32,
    },
    /// A unit word directly following a number: `min`, `mins`, `hr`, `hrs`,
    /// `deg`.
    UnitSuffix(Unit),
    /// `@name`
    Reference,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `!`
    Bang,
    /// Always the last token.
    EndOfInput,
}

/// A classified token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    /// What the token is.
    pub kind:   TokenKind,
    /// The source text of the token.
    pub lexeme: String,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl Token {
    /// Name carried by an identifier, function name or reference token,
    /// without the `@` sigil.
    #[must_use]
    pub fn name(&self) -> &str {
        self.lexeme.strip_prefix('@').unwrap_or(&self.lexeme)
    }
}

/// Splits formula source into classified tokens.
///
/// Whitespace and comments are dropped. Characters that start no token are
/// reported as `UnexpectedCharacter` errors and skipped, so the token list
/// is always usable by the parser and always ends with
/// [`TokenKind::EndOfInput`].
///
/// ## Example
/// ```
/// use zmanim_dsl::{
///     ast::Unit,
///     interpreter::lexer::{TokenKind, tokenize},
/// };
///
/// let (tokens, diagnostics) = tokenize("sunrise - 72 mins");
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
///
/// assert!(diagnostics.is_empty());
/// assert_eq!(kinds[3], TokenKind::UnitSuffix(Unit::Minutes));
/// assert_eq!(kinds.last(), Some(&TokenKind::EndOfInput));
/// ```
#[must_use]
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let raw: Vec<(Result<RawToken, ()>, Range<usize>)> = RawToken::lexer(source).spanned().collect();
    let mut tokens = Vec::with_capacity(raw.len() + 1);
    let mut diagnostics = Vec::new();

    for (index, (result, span)) in raw.iter().enumerate() {
        let lexeme = &source[span.clone()];
        let Ok(token) = result else {
            diagnostics.push(lexical_error(lexeme, span.start));
            continue;
        };
        let next_is_paren = matches!(raw.get(index + 1), Some((Ok(RawToken::LParen), _)));
        let after_number = matches!(tokens.last(), Some(Token { kind: TokenKind::Number(_), .. }));

        let kind = match token {
            RawToken::Number(value) => TokenKind::Number(OrderedFloat(*value)),
            RawToken::MonthDay((month, day)) => TokenKind::MonthDay { month: *month,
                                                                      day:   *day, },
            RawToken::Identifier => classify_identifier(lexeme, after_number, next_is_paren),
            RawToken::Reference => TokenKind::Reference,
            RawToken::LineComment | RawToken::BlockComment => continue,
            RawToken::Plus => TokenKind::Plus,
            RawToken::Minus => TokenKind::Minus,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Less => TokenKind::Less,
            RawToken::LessEqual => TokenKind::LessEqual,
            RawToken::Greater => TokenKind::Greater,
            RawToken::GreaterEqual => TokenKind::GreaterEqual,
            RawToken::EqualEqual => TokenKind::EqualEqual,
            RawToken::BangEqual => TokenKind::BangEqual,
            RawToken::AndAnd => TokenKind::AndAnd,
            RawToken::OrOr => TokenKind::OrOr,
            RawToken::Bang => TokenKind::Bang,
        };
        tokens.push(Token { kind,
                            lexeme: lexeme.to_string(),
                            offset: span.start });
    }

    tokens.push(Token { kind:   TokenKind::EndOfInput,
                        lexeme: String::new(),
                        offset: source.len(), });
    (tokens, diagnostics)
}

/// A unit word counts as a suffix only right after a number and when it is
/// not itself called; `min(a, b)` stays a function call.
fn classify_identifier(lexeme: &str, after_number: bool, next_is_paren: bool) -> TokenKind {
    if after_number
       && !next_is_paren
       && let Some(unit) = Unit::from_suffix(lexeme)
    {
        return TokenKind::UnitSuffix(unit);
    }
    match Function::from_name(lexeme) {
        Some(function) if next_is_paren => TokenKind::FunctionName(function),
        _ => TokenKind::Identifier,
    }
}

fn lexical_error(lexeme: &str, offset: usize) -> Diagnostic {
    let message = if lexeme.starts_with("/*") {
        "unterminated block comment".to_string()
    } else if lexeme == "@" {
        "expected a formula name after `@`".to_string()
    } else {
        format!("unexpected character `{lexeme}`")
    };
    Diagnostic::error(DiagnosticKind::UnexpectedCharacter, offset, message)
}
