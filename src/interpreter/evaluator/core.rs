use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    EvaluationResult,
    ast::{Ast, Expr, NodeId, Unit},
    astro::SolarDay,
    context::CalculationContext,
    error::EvalError,
    interpreter::{
        evaluator::arithmetic::{binary, compare, unary},
        value::{
            core::{MonthDay, Value},
            zman_time::ZmanTime,
        },
    },
    registry::RegistrySnapshot,
    util::num::minutes_to_delta,
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or an
/// [`EvalError`] describing why no value exists.
pub type EvalResult<T> = Result<T, EvalError>;

/// Walks formula trees for one calculation context.
///
/// The evaluator owns the state of a single evaluation call: the solar
/// calculator for the context's date, the remaining step budget, the stack
/// of formula names currently being resolved and the results of the
/// formulas resolved so far. It only reads the registry snapshot, so
/// independent evaluators can run in parallel over the same snapshot.
pub struct Evaluator<'a> {
    pub(crate) context:   CalculationContext,
    pub(crate) registry:  &'a RegistrySnapshot,
    pub(crate) solar:     SolarDay,
    budget:               usize,
    remaining:            usize,
    /// Names of the formulas whose evaluation is in progress, outermost
    /// first.
    pub(crate) resolving: Vec<&'a str>,
    /// Finished reference results, so that a formula used twice is only
    /// computed once per evaluation.
    pub(crate) resolved:  HashMap<&'a str, EvalResult<DateTime<Utc>>>,
    /// Steps recorded for a breakdown, when one was asked for.
    pub(crate) trace:     Option<Vec<Step>>,
}

impl<'a> Evaluator<'a> {
    /// Prepares an evaluation of formulas from `registry` at `context`.
    #[must_use]
    pub fn new(context: CalculationContext, registry: &'a RegistrySnapshot, depth_budget: usize) -> Self {
        Self { solar: SolarDay::local(context.date(), context.observer(), context.timezone()),
               context,
               registry,
               budget: depth_budget,
               remaining: depth_budget,
               resolving: Vec::new(),
               resolved: HashMap::new(),
               trace: None }
    }

    /// Records every call and reference evaluated from now on.
    #[must_use]
    pub fn traced(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    /// Takes the recorded steps, innermost first.
    pub fn take_steps(&mut self) -> Vec<Step> {
        self.trace.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Budget units left.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Evaluates a whole formula tree to a time on the context's date.
    pub fn evaluate(&mut self, ast: &Ast) -> EvaluationResult {
        let instant = self.eval(ast, ast.root())?.as_instant("a formula")?;
        self.within_window(instant)
    }

    /// Evaluates registry formula `name` to a time on the context's date.
    pub fn evaluate_named(&mut self, name: &str) -> EvaluationResult {
        let instant = self.eval_reference(name)?;
        self.within_window(instant)
    }

    /// Evaluates node `id` of `ast`.
    ///
    /// Unlike [`Evaluator::evaluate`], the value may be of any kind and is
    /// not checked against the result window.
    pub fn eval(&mut self, ast: &Ast, id: NodeId) -> EvalResult<Value> {
        match ast.node(id) {
            Expr::Literal { value, unit, .. } => literal(value.0, *unit),
            Expr::Identifier { name, .. } => self.eval_identifier(name),
            Expr::Reference { name, .. } => {
                let result = self.eval_reference(name).map(Value::Instant);
                self.record(ast, id, &result);
                result
            },
            Expr::Call { name,
                         function,
                         args,
                         .. } => {
                let result = match function {
                    Some(function) => self.eval_call(ast, *function, args),
                    None => Err(EvalError::invalid(format!("unknown function `{name}`"))),
                };
                self.record(ast, id, &result);
                result
            },
            Expr::MonthDay { month, day, .. } => Ok(Value::MonthDay(MonthDay::new(*month, *day)?)),
            Expr::UnaryOp { op, operand, .. } => unary(*op, self.eval(ast, *operand)?),
            Expr::BinaryOp { op, left, right, .. } => {
                let left = self.eval(ast, *left)?;
                binary(*op, left, self.eval(ast, *right)?)
            },
            Expr::Comparison { op, left, right, .. } => {
                let left = self.eval(ast, *left)?;
                compare(*op, left, self.eval(ast, *right)?)
            },
            Expr::Logical { op, left, right, .. } => self.eval_logical(ast, *op, *left, *right),
            Expr::Error { offset } => {
                Err(EvalError::invalid(format!("the formula does not parse at offset {offset}")))
            },
        }
    }

    /// Spends one budget unit, then runs `f`.
    ///
    /// Units are never given back, so the budget bounds the total number of
    /// reference resolutions and combinator calls of one evaluation.
    ///
    /// # Errors
    /// [`EvalError::DepthExceeded`] when the budget is already used up.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        let Some(remaining) = self.remaining.checked_sub(1) else {
            debug!(budget = self.budget, "step budget exhausted");
            return Err(EvalError::DepthExceeded { budget: self.budget });
        };

        self.remaining = remaining;
        f(self)
    }

    fn record(&mut self, ast: &Ast, id: NodeId, result: &EvalResult<Value>) {
        if let Some(steps) = &mut self.trace {
            steps.push(Step { expression: ast.display(id).to_string(),
                              outcome:    result.clone(), });
        }
    }

    /// Binds a final result to the context's calendar day.
    ///
    /// # Errors
    /// [`EvalError::OutsideWindow`] when the instant falls on another local
    /// date.
    pub fn within_window(&self, instant: DateTime<Utc>) -> EvaluationResult {
        let date = self.context.date();
        ZmanTime::within_day(instant, &self.context).ok_or(EvalError::OutsideWindow { instant, date })
    }
}

/// One evaluated call or reference of a breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The sub-formula in canonical form, e.g. `solar(16.1, before_sunrise)`.
    pub expression: String,
    /// What it evaluated to.
    pub outcome:    EvalResult<Value>,
}

/// Converts a literal to its runtime value.
fn literal(value: f64, unit: Option<Unit>) -> EvalResult<Value> {
    let duration = |minutes: f64| {
        minutes_to_delta(minutes).map(Value::Duration)
                                 .ok_or_else(|| EvalError::invalid(format!("{minutes} minutes is out of range")))
    };

    match unit {
        Some(Unit::Minutes) => duration(value),
        Some(Unit::Hours) => duration(value * 60.0),
        Some(Unit::Degrees) => Ok(Value::Angle(value)),
        None => Ok(Value::Number(value)),
    }
}

/// Builds [`EvalError::AstronomicalEventNotReached`].
pub(crate) fn not_reached(event: impl Into<String>) -> EvalError {
    EvalError::AstronomicalEventNotReached { event: event.into() }
}
