use crate::{
    ast::{Ast, Expr, NodeId},
    astro::{Horizon, Phase},
    error::EvalError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        symbols::{Base, Direction, Function},
        value::core::Value,
    },
};

impl Evaluator<'_> {
    /// Evaluates a call to a known function.
    ///
    /// Trees that skipped validation may still carry a wrong argument
    /// count; that is reported as [`EvalError::InvalidOperation`].
    pub(crate) fn eval_call(&mut self, ast: &Ast, function: Function, args: &[NodeId]) -> EvalResult<Value> {
        let arity = function.arity();
        if !arity.accepts(args.len()) {
            return Err(EvalError::invalid(format!("`{}` takes {arity}, but was given {}",
                                                  function.name(),
                                                  args.len())));
        }

        match (function, args) {
            (Function::Solar, [angle, direction]) => {
                self.solar_angle(ast, *angle, *direction).map(Value::Instant)
            },
            (Function::SeasonalSolar, [angle, direction]) => {
                self.seasonal_solar(ast, *angle, *direction).map(Value::Instant)
            },
            (Function::ProportionalHours, [hours, day @ ..]) => {
                self.proportional_hours(ast, *hours, day).map(Value::Instant)
            },
            (Function::ProportionalMinutes, [minutes, direction]) => {
                self.proportional_minutes(ast, *minutes, *direction).map(Value::Instant)
            },
            (Function::Midpoint, [a, b]) => {
                self.nested(|this| this.midpoint(ast, *a, *b)).map(Value::Instant)
            },
            (Function::Coalesce, alternatives) => {
                self.nested(|this| this.coalesce(ast, alternatives)).map(Value::Instant)
            },
            (Function::Min | Function::Max, operands) => {
                self.nested(|this| this.extreme(ast, function, operands)).map(Value::Instant)
            },
            (Function::If, [condition, then, otherwise]) => {
                self.nested(|this| this.choose(ast, *condition, *then, *otherwise))
            },
            (function, _) => Err(EvalError::invalid(format!("malformed call to `{}`",
                                                            function.name()))),
        }
    }
}

/// Reads a direction keyword argument.
pub(crate) fn direction_arg(ast: &Ast, id: NodeId, function: Function) -> EvalResult<Direction> {
    let direction = match ast.node(id) {
        Expr::Identifier { name, .. } => Direction::from_name(name),
        _ => None,
    };
    direction.ok_or_else(|| EvalError::invalid(format!("`{}` needs a direction", function.name())))
}

/// Reads a direction keyword that must point away from the day: before
/// sunrise or after sunset.
pub(crate) fn outward_arg(ast: &Ast, id: NodeId, function: Function) -> EvalResult<(Phase, Horizon)> {
    direction_arg(ast, id, function)?.outward().ok_or_else(|| {
        EvalError::invalid(format!("`{}` only works before sunrise or after sunset",
                                   function.name()))
    })
}

/// Reads a day definition keyword argument.
pub(crate) fn base_arg(ast: &Ast, id: NodeId) -> EvalResult<Base> {
    let base = match ast.node(id) {
        Expr::Identifier { name, .. } => Base::from_name(name),
        _ => None,
    };
    base.ok_or_else(|| EvalError::invalid("`proportional_hours` needs a day definition such as `gra`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn keywords_are_read_from_identifiers() {
        let ast = compile("solar(16.1, after_geometric_sunset)").ast.unwrap();
        let Expr::Call { args, .. } = ast.root_node() else {
            panic!("expected a call");
        };
        assert_eq!(direction_arg(&ast, args[1], Function::Solar),
                   Ok(Direction::AfterSunset(Horizon::Geometric)));
        assert_eq!(outward_arg(&ast, args[1], Function::SeasonalSolar),
                   Ok((Phase::Evening, Horizon::Geometric)));
        assert!(direction_arg(&ast, args[0], Function::Solar).is_err());
        assert!(base_arg(&ast, args[1]).is_err());
    }
}
