use ordered_float::OrderedFloat;

use crate::{
    ast::{Expr, NodeId, UnaryOperator},
    error::DiagnosticKind,
    interpreter::{
        lexer::{Token, TokenKind},
        parser::{
            binary::parse_comparison,
            core::parse_condition,
            utils::ParseState,
        },
        symbols::Function,
    },
};

/// Parses logical negation.
///
/// Grammar: `negation := '!' negation | comparison`
pub fn parse_negation(state: &mut ParseState) -> NodeId {
    if state.peek_kind() != TokenKind::Bang {
        return parse_comparison(state);
    }

    let offset = state.offset();
    state.advance();
    let operand = state.nested(parse_negation);
    state.push(Expr::UnaryOp { op: UnaryOperator::Not,
                               operand,
                               offset })
}

/// Parses a signed term. A leading `+` is accepted and dropped.
///
/// Grammar: `unary := ('-' | '+') unary | term`
pub fn parse_unary(state: &mut ParseState) -> NodeId {
    match state.peek_kind() {
        TokenKind::Minus => {
            let offset = state.offset();
            state.advance();
            let operand = state.nested(parse_unary);
            state.push(Expr::UnaryOp { op: UnaryOperator::Negate,
                                       operand,
                                       offset })
        },
        TokenKind::Plus => {
            state.advance();
            state.nested(parse_unary)
        },
        _ => parse_term(state),
    }
}

/// Parses an atom.
///
/// Grammar:
/// ```text
/// term    := literal | DAY_MONTH | reference | call | IDENT | '(' condition ')'
/// literal := NUMBER [UNIT]
/// ```
///
/// On a token that cannot start a term, reports it, consumes it unless it
/// closes or separates an enclosing group or call, and returns an error
/// marker.
pub fn parse_term(state: &mut ParseState) -> NodeId {
    let Some(token) = state.peek() else {
        return error_term(state, "an expression");
    };

    match token.kind {
        TokenKind::Number(value) => {
            state.advance();
            parse_literal(state, value, token.offset)
        },
        TokenKind::MonthDay { month, day } => {
            state.advance();
            state.push(Expr::MonthDay { month,
                                        day,
                                        offset: token.offset })
        },
        TokenKind::Reference => {
            state.advance();
            state.push(Expr::Reference { name:   token.name().to_string(),
                                         offset: token.offset, })
        },
        TokenKind::FunctionName(function) => {
            state.advance();
            parse_call(state, token, Some(function))
        },
        TokenKind::Identifier => {
            state.advance();
            if state.peek_kind() == TokenKind::LParen {
                return parse_call(state, token, None);
            }
            state.push(Expr::Identifier { name:   token.lexeme.clone(),
                                          offset: token.offset, })
        },
        TokenKind::LParen => {
            state.advance();
            parse_group(state, token.offset)
        },
        _ => error_term(state, "an expression"),
    }
}

fn parse_literal(state: &mut ParseState, value: OrderedFloat<f64>, offset: usize) -> NodeId {
    let unit = match state.peek_kind() {
        TokenKind::UnitSuffix(unit) => {
            state.advance();
            Some(unit)
        },
        _ => None,
    };
    state.push(Expr::Literal { value,
                               unit,
                               offset })
}

fn parse_group(state: &mut ParseState, open: usize) -> NodeId {
    let inner = state.enclosed(parse_condition);

    match state.peek_kind() {
        TokenKind::RParen => {
            state.advance();
        },
        TokenKind::EndOfInput => {
            state.error(DiagnosticKind::UnexpectedToken, open, "this `(` is never closed");
        },
        _ => {
            state.report_unexpected("`)`");
            state.synchronize();
            state.eat(TokenKind::RParen);
        },
    }

    inner
}

/// Parses the argument list of a call whose name was just consumed.
///
/// Grammar: `call := NAME '(' condition (',' condition)* ')'`
///
/// A malformed argument becomes an error marker and parsing resumes at the
/// next `,` or `)`, so one bad argument does not hide problems in its
/// siblings.
fn parse_call(state: &mut ParseState, name: &Token, function: Option<Function>) -> NodeId {
    state.advance();
    let mut args = Vec::new();

    if !state.eat(TokenKind::RParen) {
        loop {
            args.push(state.enclosed(parse_condition));

            if !matches!(state.peek_kind(),
                         TokenKind::Comma | TokenKind::RParen | TokenKind::EndOfInput)
            {
                state.report_unexpected("`,` or `)`");
                state.synchronize();
            }

            match state.peek_kind() {
                TokenKind::Comma => {
                    state.advance();
                },
                TokenKind::RParen => {
                    state.advance();
                    break;
                },
                _ => {
                    state.error(DiagnosticKind::UnterminatedCall,
                                name.offset,
                                format!("call to `{}` is missing its closing `)`", name.lexeme));
                    break;
                },
            }
        }
    }

    state.push(Expr::Call { name: name.lexeme.clone(),
                            function,
                            args,
                            offset: name.offset })
}

fn error_term(state: &mut ParseState, expected: &str) -> NodeId {
    let offset = state.report_unexpected(expected);
    let closes = matches!(state.peek_kind(), TokenKind::Comma | TokenKind::RParen);
    if !closes || !state.inside_parentheses() {
        state.advance();
    }
    state.push(Expr::Error { offset })
}
