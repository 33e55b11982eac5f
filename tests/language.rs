use std::fs::{self};

use chrono::{NaiveDate, Timelike};
use proptest::prelude::*;
use walkdir::WalkDir;
use zmanim_dsl::{
    CalculationContext, EvalError, EvaluationResult, FormulaRegistry, RegistrySnapshot, check,
    compile,
    error::DiagnosticKind,
    evaluate, evaluate_named, evaluate_with_breakdown,
    interpreter::lexer::{TokenKind, tokenize},
};

const BUDGET: usize = 64;

fn jerusalem(date: NaiveDate) -> CalculationContext {
    CalculationContext::new(date, 31.7683, 35.2137, 0.0, chrono_tz::Asia::Jerusalem).unwrap()
}

fn london(date: NaiveDate) -> CalculationContext {
    CalculationContext::new(date, 51.5074, -0.1278, 0.0, chrono_tz::Europe::London).unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn library() -> RegistrySnapshot {
    let registry: FormulaRegistry = [("alos", "solar(16.1, before_sunrise)"),
                                     ("alos_72", "sunrise - 72min"),
                                     ("misheyakir", "solar(11.5, before_sunrise)"),
                                     ("chatzos", "midpoint(sunrise, sunset)"),
                                     ("shkia", "sunset"),
                                     ("tzais", "solar(8.5, after_sunset)"),
                                     ("tzais_72", "sunset + 72min")].into_iter()
                                                                    .collect();
    registry.snapshot()
}

fn run(source: &str, context: &CalculationContext, registry: &RegistrySnapshot) -> EvaluationResult {
    let compilation = check(source, registry);
    assert!(compilation.is_accepted(),
            "formula `{source}` was rejected: {:?}",
            compilation.diagnostics);
    evaluate(compilation.ast.as_ref().unwrap(), context, registry, BUDGET)
}

fn assert_rejected(source: &str, kind: DiagnosticKind) {
    let compilation = check(source, &library());
    assert!(compilation.errors().any(|d| d.kind == kind),
            "expected {kind:?} for `{source}`, found {:?}",
            compilation.diagnostics);
}

#[test]
fn book_examples_work() {
    let registry = library();
    let context = jerusalem(date(2024, 3, 21));
    let mut count = 0;

    for entry in
        WalkDir::new("book/src").into_iter()
                                .filter_map(Result::ok)
                                .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
    {
        let path = entry.path();
        let content =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));

        for (i, code) in extract_dsl_blocks(&content).into_iter().enumerate() {
            count += 1;
            let compilation = check(&code, &registry);
            if !compilation.is_accepted() {
                panic!("DSL example {} in {:?} was rejected:\n{}\nDiagnostics: {:?}",
                       i + 1,
                       path,
                       code,
                       compilation.diagnostics);
            }

            let result = evaluate(compilation.ast.as_ref().unwrap(), &context, &registry, BUDGET);
            if let Err(e @ EvalError::InvalidOperation { .. }) = result {
                panic!("DSL example {} in {:?} failed at runtime:\n{}\nError: {e}",
                       i + 1,
                       path,
                       code);
            }
        }
    }

    assert!(count > 0, "No DSL examples found in book/src");
}

fn extract_dsl_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut inside = false;
    let mut buf = String::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```zmanim") {
            inside = true;
            buf.clear();
            continue;
        }
        if inside && trimmed.starts_with("```") {
            inside = false;
            blocks.push(buf.clone());
            continue;
        }
        if inside {
            buf.push_str(line);
            buf.push('\n');
        }
    }

    blocks
}

#[test]
fn unit_suffix_spacing_is_irrelevant() {
    assert_eq!(compile("72min").ast, compile("72 min").ast);
    assert_eq!(compile("72mins").ast, compile("72 min").ast);
    assert_eq!(compile("sunrise - 1.5hrs").ast.unwrap().to_string(), "sunrise - 1.5hr");
}

#[test]
fn jerusalem_equinox_sunrise() {
    let sunrise = run("sunrise", &jerusalem(date(2024, 3, 21)), &library()).unwrap();

    assert_eq!(sunrise.time().hour(), 5);
    assert!((40..=44).contains(&sunrise.time().minute()), "sunrise at {sunrise}");
}

#[test]
fn fixed_offsets_are_exact() {
    let context = jerusalem(date(2024, 3, 21));
    let registry = library();
    let shkia = run("@shkia", &context, &registry).unwrap();
    let tzais = run("@tzais_72", &context, &registry).unwrap();

    assert_eq!(tzais.seconds_from_midnight() - shkia.seconds_from_midnight(), 72 * 60);
}

#[test]
fn proportional_hours_divide_the_day_into_twelve() {
    let context = jerusalem(date(2024, 6, 21));
    let registry = library();
    let third = run("proportional_hours(3, solar_noon - 6hr, solar_noon + 6hr)", &context, &registry).unwrap();
    let expected = run("solar_noon - 3hr", &context, &registry).unwrap();

    assert!(third.seconds_from_midnight().abs_diff(expected.seconds_from_midnight()) <= 1);

    let gra = run("proportional_hours(6)", &context, &registry).unwrap();
    let chatzos = run("@chatzos", &context, &registry).unwrap();
    assert!(gra.seconds_from_midnight().abs_diff(chatzos.seconds_from_midnight()) <= 1);
}

#[test]
fn coalesce_degrades_in_polar_summer() {
    let context = london(date(2024, 6, 21));
    let registry = library();

    assert!(matches!(run("@alos", &context, &registry),
                     Err(EvalError::AstronomicalEventNotReached { .. })));
    assert_eq!(run("coalesce(@alos, solar_midnight)", &context, &registry),
               run("solar_midnight", &context, &registry));
    assert_eq!(run("first_valid(@alos, @alos_72)", &context, &registry),
               run("@alos_72", &context, &registry));
}

#[test]
fn coalesce_of_failures_is_a_failure() {
    let result = run("coalesce(@alos, solar(18, after_sunset))", &london(date(2024, 6, 21)), &library());
    assert_eq!(result,
               Err(EvalError::AllAlternativesFailed { function: "coalesce",
                                                      attempts: 2 }));
}

#[test]
fn midpoint_fails_with_either_operand() {
    let context = london(date(2024, 6, 21));
    let registry = library();

    assert!(run("midpoint(@alos, sunrise)", &context, &registry).is_err());
    assert!(run("midpoint(sunrise, @alos)", &context, &registry).is_err());
    assert!(run("midpoint(sunrise, sunset)", &context, &registry).is_ok());
}

#[test]
fn reference_cycles_terminate() {
    let registry: FormulaRegistry = [("a", "@b + 1min"), ("b", "@a - 1min")].into_iter().collect();
    let snapshot = registry.snapshot();
    let result = evaluate_named("a", &jerusalem(date(2024, 3, 21)), &snapshot, BUDGET);

    assert_eq!(result,
               Err(EvalError::CycleDetected { chain: vec!["a".into(), "b".into(), "a".into()] }));
    assert!(snapshot.calculation_order().is_err());
}

#[test]
fn deep_chains_exhaust_the_budget() {
    let mut registry = FormulaRegistry::new();
    registry.define("f0", "sunrise");
    for i in 1..=10 {
        registry.define(format!("f{i}"), format!("@f{} + 1min", i - 1));
    }
    let snapshot = registry.snapshot();
    let context = jerusalem(date(2024, 3, 21));

    assert_eq!(evaluate_named("f10", &context, &snapshot, 4),
               Err(EvalError::DepthExceeded { budget: 4 }));
    assert!(evaluate_named("f10", &context, &snapshot, BUDGET).is_ok());
}

#[test]
fn shared_references_do_not_multiply_the_work() {
    let mut registry = FormulaRegistry::new();
    registry.define("f0", "sunrise");
    for i in 1..=40 {
        registry.define(format!("f{i}"), format!("midpoint(@f{0}, @f{0})", i - 1));
    }
    let snapshot = registry.snapshot();
    let context = jerusalem(date(2024, 3, 21));

    let started = std::time::Instant::now();
    assert_eq!(evaluate_named("f40", &context, &snapshot, BUDGET),
               Err(EvalError::DepthExceeded { budget: BUDGET }));
    assert_eq!(evaluate_named("f30", &context, &snapshot, BUDGET),
               evaluate_named("f0", &context, &snapshot, BUDGET));
    assert!(started.elapsed().as_secs() < 5);
}

#[test]
fn deep_nesting_is_rejected_without_crashing() {
    let parens = format!("{}sunrise{}", "(".repeat(100_000), ")".repeat(100_000));
    assert!(compile(&parens).errors().any(|d| d.kind == DiagnosticKind::NestingTooDeep));

    let minus = format!("sunrise + {}5min", "-".repeat(100_000));
    assert!(compile(&minus).errors().any(|d| d.kind == DiagnosticKind::NestingTooDeep));

    let bangs = format!("if({}(day > 1), sunrise, sunset)", "!".repeat(100_000));
    assert!(!check(&bangs, &library()).is_accepted());

    assert!(check(&format!("{}sunrise{}", "(".repeat(100), ")".repeat(100)), &library()).is_accepted());
}

#[test]
fn day_of_year_conditions() {
    let registry = library();
    let source = "if(date > 21-May && date < 10-Jul, @tzais, @tzais_72)";

    let june = jerusalem(date(2024, 6, 21));
    assert_eq!(run(source, &june, &registry), run("@tzais", &june, &registry));
    let march = jerusalem(date(2024, 3, 21));
    assert_eq!(run(source, &march, &registry), run("@tzais_72", &march, &registry));

    assert_eq!(compile(source).ast.unwrap().to_string(),
               "if((date > 21-May) && (date < 10-Jul), @tzais, @tzais_72)");
    assert_rejected("if(date > 30-Feb, sunrise, sunset)", DiagnosticKind::InvalidArgument);
    assert_rejected("if(date > 5, sunrise, sunset)", DiagnosticKind::UnitMismatch);
}

#[test]
fn season_conditions() {
    let registry = library();
    let source = "if(season == summer, @tzais, @tzais_72)";

    let june = jerusalem(date(2024, 6, 21));
    assert_eq!(run(source, &june, &registry), run("@tzais", &june, &registry));
    let december = jerusalem(date(2024, 12, 21));
    assert_eq!(run(source, &december, &registry), run("@tzais_72", &december, &registry));

    assert_rejected("if(season < summer, sunrise, sunset)", DiagnosticKind::UnitMismatch);
    assert_rejected("if(season == 3, sunrise, sunset)", DiagnosticKind::UnitMismatch);
}

#[test]
fn breakdown_lists_each_step() {
    let registry = library();
    let context = london(date(2024, 6, 21));
    let ast = compile("coalesce(@alos, solar_midnight)").ast.unwrap();

    let breakdown = evaluate_with_breakdown(&ast, &context, &registry, BUDGET);
    let expressions: Vec<_> = breakdown.steps.iter().map(|s| s.expression.as_str()).collect();

    assert_eq!(expressions,
               ["solar(16.1, before_sunrise)", "@alos", "coalesce(@alos, solar_midnight)"]);
    assert!(matches!(breakdown.steps[1].outcome,
                     Err(EvalError::AstronomicalEventNotReached { .. })));
    assert_eq!(breakdown.result, run("solar_midnight", &context, &registry));
}

#[test]
fn unknown_names_come_with_suggestions() {
    let compilation = check("@tzeis + 5min", &library());
    let message = &compilation.errors().next().unwrap().message;

    assert!(message.contains("did you mean"), "{message}");
    assert!(message.contains("`@tzais`"), "{message}");
    assert!(!message.contains("`@alos`"), "{message}");
}

#[test]
fn time_zones_far_from_utc_keep_their_day() {
    let kiritimati =
        CalculationContext::new(date(2024, 3, 21), 1.87, -157.4, 0.0, chrono_tz::Pacific::Kiritimati).unwrap();
    let registry = library();

    let sunrise = run("sunrise", &kiritimati, &registry).unwrap();
    let noon = run("solar_noon", &kiritimati, &registry).unwrap();
    assert_eq!(sunrise.time().hour(), 6);
    assert_eq!(noon.time().hour(), 12);
}

#[test]
fn results_stay_on_the_calculation_day() {
    // Solar midnight falls on the previous evening in Jerusalem.
    let result = run("solar_midnight", &jerusalem(date(2024, 3, 21)), &library());
    assert!(matches!(result, Err(EvalError::OutsideWindow { .. })));
}

#[test]
fn conditions_pick_a_branch() {
    let registry = library();
    let summer = jerusalem(date(2024, 6, 21));
    let winter = jerusalem(date(2024, 12, 21));
    let source = "if(day_length > 12hr, @tzais, @tzais_72)";

    assert_eq!(run(source, &summer, &registry), run("@tzais", &summer, &registry));
    assert_eq!(run(source, &winter, &registry), run("@tzais_72", &winter, &registry));
}

#[test]
fn static_errors_are_reported() {
    assert_rejected("coalesce(sunrise)", DiagnosticKind::ArityMismatch);
    assert_rejected("midpoint(sunrise, sunset, solar_noon)", DiagnosticKind::ArityMismatch);
    assert_rejected("sollar(16.1, before_sunrise)", DiagnosticKind::UnknownFunction);
    assert_rejected("@plag", DiagnosticKind::UnknownReference);
    assert_rejected("sunrise + 16deg", DiagnosticKind::UnitMismatch);
    assert_rejected("sunrise + 72", DiagnosticKind::UnitMismatch);
    assert_rejected("sunrise + sunset", DiagnosticKind::UnitMismatch);
    assert_rejected("sunrise + $", DiagnosticKind::UnexpectedCharacter);
    assert_rejected("solar(16.1, before_sunrise", DiagnosticKind::UnterminatedCall);
    assert_rejected("solar(95, before_sunrise)", DiagnosticKind::InvalidArgument);
    assert_rejected("shkia", DiagnosticKind::UnknownIdentifier);
}

#[test]
fn one_pass_reports_every_problem() {
    let compilation = check("coalesce(@plag, sollar(1), sunrise + 5deg)", &library());
    let kinds: Vec<_> = compilation.errors().map(|d| d.kind).collect();

    assert!(kinds.contains(&DiagnosticKind::UnknownReference));
    assert!(kinds.contains(&DiagnosticKind::UnknownFunction));
    assert!(kinds.contains(&DiagnosticKind::UnitMismatch));
}

#[test]
fn warnings_do_not_reject() {
    let compilation = check("proportional_hours(13)", &library());

    assert!(compilation.is_accepted());
    assert!(compilation.diagnostics
                       .iter()
                       .any(|d| d.kind == DiagnosticKind::SuspiciousValue));
}

proptest! {
    #[test]
    fn tokenizer_always_terminates(source in ".{0,64}") {
        let (tokens, _) = tokenize(&source);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfInput));
    }

    #[test]
    fn compilation_never_panics(source in "[a-z0-9_@(), +\\-.*/!<>=&|]{0,48}") {
        let _ = check(&source, &library());
    }

    #[test]
    fn evaluation_is_idempotent(day in 0u64..366, latitude in -60.0f64..60.0, longitude in -180.0f64..180.0) {
        let date = date(2024, 1, 1) + chrono::Days::new(day);
        let context = CalculationContext::new(date, latitude, longitude, 0.0, chrono_tz::UTC).unwrap();
        let registry = library();
        let ast = compile("coalesce(@alos, @alos_72, solar_noon)").ast.unwrap();

        let first = evaluate(&ast, &context, &registry, BUDGET);
        let second = evaluate(&ast, &context, &registry, BUDGET);
        prop_assert_eq!(first, second);
    }
}
