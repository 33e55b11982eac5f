use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    ast::{Ast, NodeId},
    error::EvalError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        symbols::Function,
        value::{core::Value, zman_time::ZmanTime},
    },
};

impl Evaluator<'_> {
    /// `coalesce(a, b, ...)`: the first alternative that produces a time
    /// on the context's day.
    ///
    /// Alternatives run strictly left to right and every one is tried
    /// before giving up. Only [`EvalError::is_fatal`] failures stop the
    /// search early.
    pub(crate) fn coalesce(&mut self, ast: &Ast, alternatives: &[NodeId]) -> EvalResult<DateTime<Utc>> {
        for (position, alternative) in alternatives.iter().enumerate() {
            match self.eval_instant(ast, *alternative, Function::Coalesce) {
                Ok(instant) if ZmanTime::within_day(instant, &self.context).is_some() => {
                    return Ok(instant);
                },
                Ok(instant) => {
                    debug!(position, %instant, "coalesce alternative falls outside the day");
                },
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => debug!(position, %error, "coalesce alternative failed"),
            }
        }

        Err(EvalError::AllAlternativesFailed { function: Function::Coalesce.name(),
                                               attempts: alternatives.len() })
    }

    /// `min(...)` or `max(...)` over the operands that succeed.
    pub(crate) fn extreme(&mut self,
                          ast: &Ast,
                          function: Function,
                          operands: &[NodeId])
                          -> EvalResult<DateTime<Utc>> {
        let mut best: Option<DateTime<Utc>> = None;

        for (position, operand) in operands.iter().enumerate() {
            match self.eval_instant(ast, *operand, function) {
                Ok(instant) => {
                    best = Some(match best {
                                    Some(current) if function == Function::Min => current.min(instant),
                                    Some(current) => current.max(instant),
                                    None => instant,
                                });
                },
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => debug!(function = function.name(), position, %error, "operand failed"),
            }
        }

        best.ok_or(EvalError::AllAlternativesFailed { function: function.name(),
                                                      attempts: operands.len() })
    }

    /// `if(condition, then, else)`. Only the selected branch runs.
    ///
    /// A time-valued condition holds when it can be computed; a condition
    /// that fails selects the else branch.
    pub(crate) fn choose(&mut self,
                         ast: &Ast,
                         condition: NodeId,
                         then: NodeId,
                         otherwise: NodeId)
                         -> EvalResult<Value> {
        let holds = match self.eval(ast, condition) {
            Ok(Value::Bool(holds)) => holds,
            Ok(Value::Instant(_)) => true,
            Ok(other) => {
                return Err(EvalError::invalid(format!("the condition of `if` must be a \
                                                       comparison or a time, found a {}",
                                                      other.kind())));
            },
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                debug!(%error, "if condition failed, taking the else branch");
                false
            },
        };

        self.eval(ast, if holds { then } else { otherwise })
    }

    fn eval_instant(&mut self, ast: &Ast, id: NodeId, function: Function) -> EvalResult<DateTime<Utc>> {
        self.eval(ast, id)?.as_instant(&format!("an operand of `{}`", function.name()))
    }
}
