use std::cmp::Ordering;

use crate::{
    ast::{Ast, BinaryOperator, CompareOperator, LogicalOperator, NodeId, UnaryOperator},
    error::EvalError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator},
        value::core::Value,
    },
};

/// Applies a prefix operator.
pub fn unary(op: UnaryOperator, operand: Value) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOperator::Negate, Value::Duration(d)) => Ok(Value::Duration(-d)),
        (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOperator::Negate, Value::Angle(a)) => Ok(Value::Angle(-a)),
        (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOperator::Negate, other) => {
            Err(EvalError::invalid(format!("cannot negate a {}", other.kind())))
        },
        (UnaryOperator::Not, other) => {
            Err(EvalError::invalid(format!("`!` needs a condition, found a {}", other.kind())))
        },
    }
}

/// Applies unit-aware `+` or `-`.
///
/// ## Example
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use zmanim_dsl::{
///     ast::BinaryOperator,
///     interpreter::{evaluator::arithmetic::binary, value::core::Value},
/// };
///
/// let noon = Utc.with_ymd_and_hms(2024, 3, 21, 12, 0, 0).unwrap();
/// let later = binary(BinaryOperator::Add, Value::Instant(noon), Value::Duration(TimeDelta::minutes(18)));
///
/// assert_eq!(later, Ok(Value::Instant(Utc.with_ymd_and_hms(2024, 3, 21, 12, 18, 0).unwrap())));
/// assert!(binary(BinaryOperator::Add, Value::Instant(noon), Value::Instant(noon)).is_err());
/// ```
pub fn binary(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
    use BinaryOperator::{Add, Sub};
    use Value::{Angle, Duration, Instant, Number};

    let out_of_range = || EvalError::invalid("time arithmetic out of range");

    match (op, left, right) {
        (Add, Instant(t), Duration(d)) | (Add, Duration(d), Instant(t)) => {
            t.checked_add_signed(d).map(Instant).ok_or_else(out_of_range)
        },
        (Sub, Instant(t), Duration(d)) => t.checked_sub_signed(d).map(Instant).ok_or_else(out_of_range),
        (Sub, Instant(a), Instant(b)) => Ok(Duration(a.signed_duration_since(b))),
        (Add, Duration(a), Duration(b)) => a.checked_add(&b).map(Duration).ok_or_else(out_of_range),
        (Sub, Duration(a), Duration(b)) => a.checked_sub(&b).map(Duration).ok_or_else(out_of_range),
        (_, Number(a), Number(b)) => Ok(Number(apply(op, a, b))),
        (_, Number(a) | Angle(a), Number(b) | Angle(b)) => Ok(Angle(apply(op, a, b))),
        (_, l, r) => {
            let verb = match op {
                Add => "add",
                Sub => "subtract",
            };
            Err(EvalError::invalid(format!("cannot {verb} a {} and a {}", l.kind(), r.kind())))
        },
    }
}

const fn apply(op: BinaryOperator, a: f64, b: f64) -> f64 {
    match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
    }
}

/// Compares two values of the same kind. Numbers and angles compare with
/// each other. Days of the year are ordered within the calendar year;
/// booleans and seasons only support `==` and `!=`.
pub fn compare(op: CompareOperator, left: Value, right: Value) -> EvalResult<Value> {
    let ordering = match (left, right) {
        (Value::Instant(a), Value::Instant(b)) => Some(a.cmp(&b)),
        (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(&b)),
        (Value::Number(a) | Value::Angle(a), Value::Number(b) | Value::Angle(b)) => a.partial_cmp(&b),
        (Value::MonthDay(a), Value::MonthDay(b)) => Some(a.cmp(&b)),
        (Value::Season(a), Value::Season(b))
            if matches!(op, CompareOperator::Equal | CompareOperator::NotEqual) =>
        {
            Some(if a == b { Ordering::Equal } else { Ordering::Less })
        },
        (Value::Bool(a), Value::Bool(b))
            if matches!(op, CompareOperator::Equal | CompareOperator::NotEqual) =>
        {
            Some(a.cmp(&b))
        },
        (l, r) => {
            return Err(EvalError::invalid(format!("cannot compare a {} with a {}",
                                                  l.kind(),
                                                  r.kind())));
        },
    };

    // NaN is unordered: only `!=` holds.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(op == CompareOperator::NotEqual));
    };

    Ok(Value::Bool(holds(op, ordering)))
}

const fn holds(op: CompareOperator, ordering: Ordering) -> bool {
    match op {
        CompareOperator::Less => ordering.is_lt(),
        CompareOperator::LessEqual => ordering.is_le(),
        CompareOperator::Greater => ordering.is_gt(),
        CompareOperator::GreaterEqual => ordering.is_ge(),
        CompareOperator::Equal => ordering.is_eq(),
        CompareOperator::NotEqual => ordering.is_ne(),
    }
}

impl Evaluator<'_> {
    /// Evaluates `&&` / `||`, skipping the right side when the left side
    /// decides the result.
    pub(crate) fn eval_logical(&mut self,
                               ast: &Ast,
                               op: LogicalOperator,
                               left: NodeId,
                               right: NodeId)
                               -> EvalResult<Value> {
        let left = self.eval(ast, left)?.as_bool("the left side of a logical operator")?;
        let decided = match op {
            LogicalOperator::And => !left,
            LogicalOperator::Or => left,
        };
        if decided {
            return Ok(Value::Bool(left));
        }

        let right = self.eval(ast, right)?.as_bool("the right side of a logical operator")?;
        Ok(Value::Bool(right))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;
    use crate::interpreter::value::core::{MonthDay, Season};

    #[test]
    fn time_minus_time_is_a_duration() {
        let a = Utc.with_ymd_and_hms(2024, 3, 21, 18, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 21, 6, 0, 0).unwrap();
        assert_eq!(binary(BinaryOperator::Sub, Value::Instant(a), Value::Instant(b)),
                   Ok(Value::Duration(TimeDelta::hours(12))));
    }

    #[test]
    fn durations_negate_and_combine() {
        let d = Value::Duration(TimeDelta::minutes(72));
        assert_eq!(unary(UnaryOperator::Negate, d), Ok(Value::Duration(TimeDelta::minutes(-72))));
        assert_eq!(binary(BinaryOperator::Sub, d, Value::Duration(TimeDelta::minutes(12))),
                   Ok(Value::Duration(TimeDelta::hours(1))));
    }

    #[test]
    fn degrees_and_durations_do_not_mix() {
        let result = binary(BinaryOperator::Add,
                            Value::Duration(TimeDelta::minutes(5)),
                            Value::Angle(16.1));
        assert!(matches!(result, Err(EvalError::InvalidOperation { .. })));
    }

    #[test]
    fn comparisons() {
        let lt = compare(CompareOperator::Less, Value::Number(3.0), Value::Angle(16.1));
        assert_eq!(lt, Ok(Value::Bool(true)));
        let ne = compare(CompareOperator::NotEqual, Value::Number(f64::NAN), Value::Number(1.0));
        assert_eq!(ne, Ok(Value::Bool(true)));
        assert!(compare(CompareOperator::Less, Value::Bool(true), Value::Bool(false)).is_err());
        assert!(compare(CompareOperator::Equal,
                        Value::Number(1.0),
                        Value::Duration(TimeDelta::zero())).is_err());
    }

    #[test]
    fn days_of_the_year_and_seasons() {
        let may = Value::MonthDay(MonthDay::new(5, 21).unwrap());
        let june = Value::MonthDay(MonthDay::new(6, 2).unwrap());
        assert_eq!(compare(CompareOperator::Less, may, june), Ok(Value::Bool(true)));
        assert_eq!(compare(CompareOperator::GreaterEqual, may, may), Ok(Value::Bool(true)));

        let summer = Value::Season(Season::Summer);
        let winter = Value::Season(Season::Winter);
        assert_eq!(compare(CompareOperator::NotEqual, summer, winter), Ok(Value::Bool(true)));
        assert_eq!(compare(CompareOperator::Equal, summer, summer), Ok(Value::Bool(true)));
        assert!(compare(CompareOperator::Less, summer, winter).is_err());
    }
}
