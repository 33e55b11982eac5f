//! # zmanim-dsl
//!
//! zmanim-dsl is a formula language and evaluation engine for zmanim, the
//! daily times of Jewish law, written in Rust. It compiles short formulas
//! such as `coalesce(solar(16.1, before_sunrise), solar_midnight)` into
//! syntax trees, checks them statically against a registry of named
//! formulas, and evaluates them to a local time of day for a given date and
//! location.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use chrono::NaiveDate;
use chrono_tz::Tz;

pub use crate::{
    config::EngineConfig,
    context::CalculationContext,
    error::{Diagnostic, EvalError},
    interpreter::{
        evaluator::core::Step,
        validator::core::{validate, validate_named},
        value::zman_time::ZmanTime,
    },
    registry::{FormulaRegistry, RegistrySnapshot},
};
use crate::{
    ast::Ast,
    interpreter::{evaluator::core::Evaluator, lexer::tokenize, parser::core::parse},
};

/// Defines the structure of compiled formulas.
///
/// This module declares the `Expr` enum and the index-based [`ast::Ast`]
/// arena that the parser builds and the validator and evaluator walk.
///
/// # Responsibilities
/// - Defines expression nodes for every language construct.
/// - Records source offsets on nodes for diagnostics.
/// - Renders trees back to canonical formula text.
pub mod ast;
/// Solar position calculations.
///
/// Computes sunrise, sunset, solar noon and depression-angle crossings for
/// a date and observer with the NOAA solar calculator equations.
///
/// # Responsibilities
/// - Converts dates to Julian days and evaluates the solar position series.
/// - Applies refraction and elevation dip for visible sunrise and sunset.
/// - Reports events the sun does not reach as missing, never clamped.
pub mod astro;
/// Parallel evaluation of many formulas, dates and locations.
pub mod batch;
/// Engine settings and the TOML configuration file.
pub mod config;
/// The date and place a formula is evaluated for.
pub mod context;
/// Provides diagnostics and evaluation failures.
///
/// Lexical, syntax and semantic problems are collected as
/// [`Diagnostic`] values; evaluation failures are [`EvalError`] values
/// returned as data.
///
/// # Responsibilities
/// - Defines the diagnostic taxonomy with severities and source offsets.
/// - Defines the typed reasons an evaluation produces no time.
/// - Renders diagnostics against the source text for display.
pub mod error;
/// Orchestrates compilation and evaluation of formulas.
///
/// This module ties together lexing, parsing, validation, evaluation and
/// value representations.
///
/// # Responsibilities
/// - Coordinates the lexer, parser, validator and evaluator.
/// - Declares the closed tables of functions and keywords.
/// - Defines runtime values and the final time-of-day result.
pub mod interpreter;
/// Named formulas, compiled once and shared through snapshots.
pub mod registry;
/// General utilities for safe numeric conversion.
///
/// # Responsibilities
/// - Safely convert between `i64` and `f64` without silent data loss.
/// - Convert fractional minutes to and from `chrono` durations.
pub mod util;

/// Result of evaluating a formula: a time of day on the calculation date, or
/// the reason there is none.
pub type EvaluationResult = Result<ZmanTime, EvalError>;

/// Output of [`compile`]: the tree, if any could be built, and every
/// lexical and syntax diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    /// The best-effort tree. It may contain error markers when
    /// `diagnostics` holds errors.
    pub ast:         Option<Ast>,
    /// Diagnostics in the order they were found, lexical ones first.
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// Whether a tree exists and no diagnostic is an error.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.ast.is_some() && !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The error-level diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

/// Compiles formula source into a tree.
///
/// Never fails: problems are returned as diagnostics next to the
/// best-effort tree.
///
/// ## Example
/// ```
/// use zmanim_dsl::compile;
///
/// let compiled = compile("@alos + 72 mins");
/// assert!(compiled.is_accepted());
/// assert_eq!(compiled.ast.unwrap().to_string(), "@alos + 72min");
///
/// let broken = compile("sunrise + # 5min");
/// assert!(!broken.is_accepted());
/// ```
#[must_use]
pub fn compile(source: &str) -> Compilation {
    let (tokens, mut diagnostics) = tokenize(source);
    let (ast, syntax) = parse(&tokens);
    diagnostics.extend(syntax);
    Compilation { ast, diagnostics }
}

/// Compiles `source` and validates it against `registry`.
///
/// Validation runs even when there are syntax errors, so one pass reports
/// as many problems as possible. A formula is fit for storage when the
/// result [`Compilation::is_accepted`].
///
/// ## Example
/// ```
/// use zmanim_dsl::{FormulaRegistry, check};
///
/// let registry = FormulaRegistry::new().snapshot();
///
/// assert!(check("sunrise - 72min", &registry).is_accepted());
/// assert!(!check("sunrise - 72deg", &registry).is_accepted());
/// assert!(!check("@alos + 5min", &registry).is_accepted());
/// ```
#[must_use]
pub fn check(source: &str, registry: &RegistrySnapshot) -> Compilation {
    let mut compilation = compile(source);
    if let Some(ast) = &compilation.ast {
        compilation.diagnostics.extend(validate(ast, registry));
    }
    compilation
}

/// Evaluates a compiled formula.
///
/// `depth_budget` bounds how many references and combinator calls one
/// evaluation may make in total, with each referenced formula resolved at
/// most once; see [`config::DEFAULT_DEPTH_BUDGET`].
///
/// ## Example
/// ```
/// use chrono::NaiveDate;
/// use zmanim_dsl::{CalculationContext, FormulaRegistry, compile, evaluate};
///
/// let context = CalculationContext::new(NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
///                                       31.7683,
///                                       35.2137,
///                                       0.0,
///                                       chrono_tz::Asia::Jerusalem).unwrap();
/// let registry = FormulaRegistry::new().snapshot();
/// let ast = compile("midpoint(sunrise, sunset)").ast.unwrap();
///
/// let chatzos = evaluate(&ast, &context, &registry, 64).unwrap();
/// assert!(chatzos.to_string().starts_with("11:"));
/// ```
#[must_use]
pub fn evaluate(ast: &Ast,
                context: &CalculationContext,
                registry: &RegistrySnapshot,
                depth_budget: usize)
                -> EvaluationResult {
    Evaluator::new(*context, registry, depth_budget).evaluate(ast)
}

/// Output of [`evaluate_with_breakdown`].
#[derive(Debug, Clone, PartialEq)]
pub struct Breakdown {
    /// Same as [`evaluate`] would return.
    pub result: EvaluationResult,
    /// Every reference and function call, innermost first, with its value.
    pub steps:  Vec<Step>,
}

/// Evaluates a compiled formula and records the value of each reference and
/// function call on the way, for showing how a time was derived.
///
/// ## Example
/// ```
/// use chrono::NaiveDate;
/// use zmanim_dsl::{CalculationContext, FormulaRegistry, compile, evaluate_with_breakdown};
///
/// let context = CalculationContext::new(NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
///                                       31.7683,
///                                       35.2137,
///                                       0.0,
///                                       chrono_tz::Asia::Jerusalem).unwrap();
/// let registry: FormulaRegistry = [("shkia", "sunset")].into_iter().collect();
/// let ast = compile("midpoint(sunrise, @shkia)").ast.unwrap();
///
/// let breakdown = evaluate_with_breakdown(&ast, &context, &registry.snapshot(), 64);
/// let expressions: Vec<_> = breakdown.steps.iter().map(|s| s.expression.as_str()).collect();
/// assert_eq!(expressions, ["@shkia", "midpoint(sunrise, @shkia)"]);
/// assert!(breakdown.result.is_ok());
/// ```
#[must_use]
pub fn evaluate_with_breakdown(ast: &Ast,
                               context: &CalculationContext,
                               registry: &RegistrySnapshot,
                               depth_budget: usize)
                               -> Breakdown {
    let mut evaluator = Evaluator::new(*context, registry, depth_budget).traced();
    let result = evaluator.evaluate(ast);
    Breakdown { result, steps: evaluator.take_steps() }
}

/// Evaluates formula `name` of `registry`.
#[must_use]
pub fn evaluate_named(name: &str,
                      context: &CalculationContext,
                      registry: &RegistrySnapshot,
                      depth_budget: usize)
                      -> EvaluationResult {
    Evaluator::new(*context, registry, depth_budget).evaluate_named(name)
}

/// A formula to evaluate: a registry name or an already compiled tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula<'f> {
    /// A formula of the registry snapshot.
    Named(&'f str),
    /// A compiled tree, e.g. a formula being previewed before it is stored.
    Compiled(&'f Ast),
}

impl<'f> From<&'f Ast> for Formula<'f> {
    fn from(ast: &'f Ast) -> Self {
        Self::Compiled(ast)
    }
}

/// Evaluates a formula from raw date, location and time zone inputs.
///
/// # Errors
/// Coordinates that [`CalculationContext::new`] rejects come back as
/// [`EvalError::InvalidContext`].
///
/// ## Example
/// ```
/// use chrono::NaiveDate;
/// use zmanim_dsl::{EngineConfig, FormulaRegistry, Formula, evaluate_at};
///
/// let registry: FormulaRegistry = [("shkia", "sunset")].into_iter().collect();
/// let date = NaiveDate::from_ymd_opt(2024, 3, 21).unwrap();
///
/// let shkia = evaluate_at(Formula::Named("shkia"),
///                         date,
///                         31.7683,
///                         35.2137,
///                         0.0,
///                         chrono_tz::Asia::Jerusalem,
///                         &registry.snapshot(),
///                         &EngineConfig::default());
/// assert!(shkia.is_ok());
/// ```
#[allow(clippy::too_many_arguments)]
pub fn evaluate_at(formula: Formula<'_>,
                   date: NaiveDate,
                   latitude: f64,
                   longitude: f64,
                   elevation: f64,
                   timezone: Tz,
                   registry: &RegistrySnapshot,
                   config: &EngineConfig)
                   -> EvaluationResult {
    let context = CalculationContext::new(date, latitude, longitude, elevation, timezone)?;
    match formula {
        Formula::Named(name) => evaluate_named(name, &context, registry, config.depth_budget),
        Formula::Compiled(ast) => evaluate(ast, &context, registry, config.depth_budget),
    }
}
