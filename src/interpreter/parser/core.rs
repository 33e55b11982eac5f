use crate::{
    ast::{Ast, Expr, NodeId},
    error::{Diagnostic, DiagnosticKind},
    interpreter::{
        lexer::Token,
        parser::{
            binary::parse_disjunction,
            utils::{ParseState, describe},
        },
    },
};

/// Parses a token stream into a formula tree.
///
/// This is the entry point of the parser. Parsing never stops at the first
/// problem: a malformed sub-expression becomes an [`Expr::Error`] marker and
/// the surrounding call or operator keeps going, so that the validator can
/// still check the rest.
///
/// Grammar: `formula := condition EOF`
///
/// # Returns
/// The tree, or `None` when the input holds no expression at all, plus
/// every syntax diagnostic found.
///
/// ## Example
/// ```
/// use zmanim_dsl::interpreter::{lexer::tokenize, parser::core::parse};
///
/// let (tokens, _) = tokenize("coalesce(solar(16.1, before_sunrise), )");
/// let (ast, diagnostics) = parse(&tokens);
///
/// assert!(ast.is_some());
/// assert_eq!(diagnostics.len(), 1);
/// ```
#[must_use]
pub fn parse(tokens: &[Token]) -> (Option<Ast>, Vec<Diagnostic>) {
    let mut state = ParseState::new(tokens);

    if state.peek().is_none() {
        let offset = state.offset();
        state.error(DiagnosticKind::UnexpectedToken, offset, "formula is empty");
        return (None, state.diagnostics);
    }

    let mut root = parse_condition(&mut state);
    // Junk in front of the formula: skip it and parse what follows.
    while matches!(state.arena.get(root), Expr::Error { .. }) && state.peek().is_some() {
        root = parse_condition(&mut state);
    }

    if let Some(token) = state.peek() {
        state.error(DiagnosticKind::UnexpectedToken,
                    token.offset,
                    format!("unexpected {} after the end of the formula", describe(token)));
    }

    let ParseState { arena, diagnostics, .. } = state;
    if matches!(arena.get(root), Expr::Error { .. }) {
        return (None, diagnostics);
    }
    (Some(arena.finish(root)), diagnostics)
}

/// Parses a full condition, the widest expression the grammar knows.
///
/// Grammar: `condition := conjunction ('||' conjunction)*`
pub fn parse_condition(state: &mut ParseState) -> NodeId {
    parse_disjunction(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BinaryOperator, Unit},
        interpreter::lexer::tokenize,
    };

    fn parse_source(source: &str) -> (Option<Ast>, Vec<Diagnostic>) {
        let (tokens, lexical) = tokenize(source);
        assert!(lexical.is_empty(), "{lexical:?}");
        parse(&tokens)
    }

    fn parse_ok(source: &str) -> Ast {
        let (ast, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "{source}: {diagnostics:?}");
        ast.unwrap()
    }

    #[test]
    fn spaced_and_unspaced_units_give_identical_literals() {
        let a = parse_ok("72min");
        let b = parse_ok("72 mins");
        assert_eq!(a.root_node(), b.root_node());
        assert!(matches!(a.root_node(), Expr::Literal { unit: Some(Unit::Minutes), .. }));
    }

    #[test]
    fn subtraction_is_left_associative() {
        let ast = parse_ok("sunset - 18min - 2min");
        let Expr::BinaryOp { op: BinaryOperator::Sub, left, .. } = ast.root_node() else {
            panic!("expected subtraction at the root");
        };
        assert!(matches!(ast.node(*left), Expr::BinaryOp { op: BinaryOperator::Sub, .. }));
        assert_eq!(ast.to_string(), "sunset - 18min - 2min");
    }

    #[test]
    fn parentheses_group() {
        let ast = parse_ok("sunset - (18min + 2min)");
        assert_eq!(ast.to_string(), "sunset - (18min + 2min)");
    }

    #[test]
    fn calls_collect_arguments_in_order() {
        let ast = parse_ok("coalesce(@alos, solar_midnight, sunrise - 72min)");
        let Expr::Call { args, function, .. } = ast.root_node() else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 3);
        assert!(function.is_some());
        assert!(matches!(ast.node(args[0]), Expr::Reference { name, .. } if name == "alos"));
    }

    #[test]
    fn unknown_names_still_parse_as_calls() {
        let ast = parse_ok("sollar(16.1, before_sunrise)");
        assert!(matches!(ast.root_node(), Expr::Call { function: None, .. }));
    }

    #[test]
    fn condition_operators_bind_looser_than_arithmetic() {
        let ast = parse_ok("if(latitude > 60 && !(month == 6), sunrise, sunset)");
        assert_eq!(ast.to_string(), "if((latitude > 60) && !(month == 6), sunrise, sunset)");
    }

    #[test]
    fn bad_argument_keeps_siblings() {
        let (ast, diagnostics) = parse_source("min(sunrise, +, sunset)");
        let ast = ast.unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].offset, 14);
        let Expr::Call { args, .. } = ast.root_node() else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 3);
        assert!(matches!(ast.node(args[1]), Expr::Error { .. }));
        assert!(matches!(ast.node(args[2]), Expr::Identifier { name, .. } if name == "sunset"));
    }

    #[test]
    fn missing_close_paren_is_unterminated_call() {
        let (ast, diagnostics) = parse_source("midpoint(sunrise, sunset");
        assert!(ast.is_some());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnterminatedCall);
        assert_eq!(diagnostics[0].offset, 0);
    }

    #[test]
    fn junk_between_arguments_is_skipped() {
        let (ast, diagnostics) = parse_source("max(sunrise 5, sunset)");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnexpectedToken);
        let Expr::Call { args, .. } = ast.unwrap().root_node().clone() else {
            panic!("expected a call");
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn trailing_tokens_are_reported() {
        let (ast, diagnostics) = parse_source("sunrise sunset");
        assert!(ast.is_some());
        assert_eq!(diagnostics[0].offset, 8);
    }

    #[test]
    fn stray_leading_tokens_are_skipped() {
        let (ast, diagnostics) = parse_source(") sunrise - 5min");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].offset, 0);
        assert_eq!(ast.unwrap().to_string(), "sunrise - 5min");

        let (ast, diagnostics) = parse_source(", , sunset");
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(ast.unwrap().to_string(), "sunset");
    }

    #[test]
    fn rendering_keeps_grouping() {
        for source in ["(latitude > 1 || month == 2) == (day > 3)",
                       "sunrise - (sunset - sunrise)",
                       "-(5min + 1min) + sunrise",
                       "!(month == 1) && (day == 2 || day == 3)",
                       "if(date >= 21-May && date < 10-Jul, sunrise, sunset)"]
        {
            let rendered = parse_ok(source).to_string();
            assert_eq!(parse_ok(&rendered).to_string(), rendered, "{source}");
        }

        let ast = parse_ok("(latitude > 1 || month == 2) == (day > 3)");
        assert_eq!(ast.to_string(), "((latitude > 1) || (month == 2)) == (day > 3)");
        let reparsed = parse_ok(&ast.to_string());
        let Expr::Comparison { left, .. } = reparsed.root_node() else {
            panic!("expected a comparison at the root");
        };
        assert!(matches!(reparsed.node(*left), Expr::Logical { .. }));
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let deep = format!("{}sunrise{}", "(".repeat(5_000), ")".repeat(5_000));
        let (ast, diagnostics) = parse_source(&deep);
        assert!(ast.is_none());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NestingTooDeep);

        let (_, diagnostics) = parse_source(&format!("sunrise + {}5min", "-".repeat(50_000)));
        assert_eq!(diagnostics.iter().map(|d| d.kind).collect::<Vec<_>>(),
                   [DiagnosticKind::NestingTooDeep]);

        let (ast, diagnostics) = parse_source(&format!("sunrise{}", " + 1min".repeat(5_000)));
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NestingTooDeep);
        assert!(ast.unwrap().contains_errors());
    }

    #[test]
    fn shallow_nesting_is_fine() {
        let source = format!("{}sunrise{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(parse_ok(&source).to_string(), "sunrise");
    }

    #[test]
    fn empty_and_hopeless_input_give_no_tree() {
        assert!(parse_source("").0.is_none());
        assert!(parse_source("// only a comment").0.is_none());
        let (ast, diagnostics) = parse_source(")");
        assert!(ast.is_none());
        assert!(!diagnostics.is_empty());
    }
}
