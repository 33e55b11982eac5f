use crate::{
    ast::{BinaryOperator, CompareOperator, Expr, LogicalOperator, NodeId},
    interpreter::{
        lexer::TokenKind,
        parser::{
            unary::{parse_negation, parse_unary},
            utils::ParseState,
        },
    },
};

/// Parses a logical OR chain.
///
/// Grammar: `condition := conjunction ('||' conjunction)*`
pub fn parse_disjunction(state: &mut ParseState) -> NodeId {
    let mut left = parse_conjunction(state);

    while state.peek_kind() == TokenKind::OrOr {
        let offset = state.offset();
        state.advance();
        let right = parse_conjunction(state);
        left = state.push(Expr::Logical { op: LogicalOperator::Or,
                                          left,
                                          right,
                                          offset });
    }

    left
}

/// Parses a logical AND chain.
///
/// Grammar: `conjunction := negation ('&&' negation)*`
pub fn parse_conjunction(state: &mut ParseState) -> NodeId {
    let mut left = parse_negation(state);

    while state.peek_kind() == TokenKind::AndAnd {
        let offset = state.offset();
        state.advance();
        let right = parse_negation(state);
        left = state.push(Expr::Logical { op: LogicalOperator::And,
                                          left,
                                          right,
                                          offset });
    }

    left
}

/// Parses an optional single comparison. Comparisons do not chain.
///
/// Grammar: `comparison := expr [CMP expr]`
pub fn parse_comparison(state: &mut ParseState) -> NodeId {
    let left = parse_additive(state);

    let Some(op) = compare_operator(state.peek_kind()) else {
        return left;
    };
    let offset = state.offset();
    state.advance();
    let right = parse_additive(state);

    state.push(Expr::Comparison { op,
                                  left,
                                  right,
                                  offset })
}

/// Parses left-associative addition and subtraction.
///
/// Grammar: `expr := unary (('+' | '-') unary)*`
pub fn parse_additive(state: &mut ParseState) -> NodeId {
    let mut left = parse_unary(state);

    loop {
        let op = match state.peek_kind() {
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Sub,
            _ => break,
        };
        let offset = state.offset();
        state.advance();
        let right = parse_unary(state);
        left = state.push(Expr::BinaryOp { op,
                                           left,
                                           right,
                                           offset });
    }

    left
}

const fn compare_operator(kind: TokenKind) -> Option<CompareOperator> {
    match kind {
        TokenKind::Less => Some(CompareOperator::Less),
        TokenKind::LessEqual => Some(CompareOperator::LessEqual),
        TokenKind::Greater => Some(CompareOperator::Greater),
        TokenKind::GreaterEqual => Some(CompareOperator::GreaterEqual),
        TokenKind::EqualEqual => Some(CompareOperator::Equal),
        TokenKind::BangEqual => Some(CompareOperator::NotEqual),
        _ => None,
    }
}
