//! Static typing rules for operators.
//!
//! Each rule takes the kinds of the operands and returns the kind of the
//! result, or a message explaining why the combination makes no sense.

use crate::{
    ast::{BinaryOperator, CompareOperator, UnaryOperator},
    interpreter::value::core::ValueKind::{self, Angle, Boolean, Date, Duration, Instant, Number, Season},
};

/// Result kind of a prefix operator.
pub fn unary(op: UnaryOperator, operand: ValueKind) -> Result<ValueKind, String> {
    match (op, operand) {
        (UnaryOperator::Negate, Duration | Number | Angle) => Ok(operand),
        (UnaryOperator::Negate, Instant | Date | Season) => Err(format!("a {operand} cannot be negated")),
        (UnaryOperator::Negate, Boolean) => {
            Err("a condition cannot be negated with `-`; use `!`".to_string())
        },
        (UnaryOperator::Not, Boolean) => Ok(Boolean),
        (UnaryOperator::Not, other) => Err(format!("`!` needs a condition, found a {other}")),
    }
}

/// Result kind of `+` or `-`.
///
/// ## Example
/// ```
/// use zmanim_dsl::{
///     ast::BinaryOperator,
///     interpreter::{validator::units::binary, value::core::ValueKind},
/// };
///
/// assert_eq!(binary(BinaryOperator::Sub, ValueKind::Instant, ValueKind::Duration),
///            Ok(ValueKind::Instant));
/// assert!(binary(BinaryOperator::Add, ValueKind::Instant, ValueKind::Instant).is_err());
/// ```
pub fn binary(op: BinaryOperator, left: ValueKind, right: ValueKind) -> Result<ValueKind, String> {
    use BinaryOperator::{Add, Sub};

    match (op, left, right) {
        (Add, Instant, Duration) | (Add, Duration, Instant) | (Sub, Instant, Duration) => Ok(Instant),
        (Sub, Instant, Instant) | (_, Duration, Duration) => Ok(Duration),
        (_, Number, Number) => Ok(Number),
        (_, Number | Angle, Number | Angle) => Ok(Angle),
        (Add, Instant, Instant) => {
            Err("two times cannot be added; subtract them to get a duration".to_string())
        },
        (Sub, Duration, Instant) => Err("a time cannot be subtracted from a duration".to_string()),
        (_, Instant | Duration, Number) | (_, Number, Instant | Duration) => {
            Err("a bare number cannot be combined with a time or duration; add a unit such as \
                 `72min`"
                        .to_string())
        },
        (_, Boolean, _) | (_, _, Boolean) => {
            Err("conditions cannot be used in arithmetic".to_string())
        },
        (_, l, r) => Err(format!("a {l} and a {r} cannot be combined")),
    }
}

/// Result kind of a comparison; always boolean when legal.
pub fn comparison(op: CompareOperator, left: ValueKind, right: ValueKind) -> Result<ValueKind, String> {
    match (left, right) {
        (Boolean, Boolean) if matches!(op, CompareOperator::Equal | CompareOperator::NotEqual) => {
            Ok(Boolean)
        },
        (Boolean, Boolean) => Err("conditions can only be compared with `==` and `!=`".to_string()),
        (Season, Season) if matches!(op, CompareOperator::Equal | CompareOperator::NotEqual) => {
            Ok(Boolean)
        },
        (Season, Season) => Err("seasons can only be compared with `==` and `!=`".to_string()),
        (l, r) if l == r || (l.is_numeric() && r.is_numeric()) => Ok(Boolean),
        (l, r) => Err(format!("a {l} cannot be compared with a {r}")),
    }
}

/// Result kind of `&&` or `||`.
pub fn logical(left: ValueKind, right: ValueKind) -> Result<ValueKind, String> {
    match (left, right) {
        (Boolean, Boolean) => Ok(Boolean),
        (Boolean, other) | (other, _) => Err(format!("`&&` and `||` need conditions, found a {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_do_not_mix_with_time() {
        assert!(binary(BinaryOperator::Add, Duration, Angle).is_err());
        assert!(binary(BinaryOperator::Add, Instant, Angle).is_err());
        assert_eq!(binary(BinaryOperator::Sub, Angle, Number), Ok(Angle));
    }

    #[test]
    fn bare_numbers_need_a_unit_next_to_times() {
        let message = binary(BinaryOperator::Add, Instant, Number).unwrap_err();
        assert!(message.contains("72min"));
    }

    #[test]
    fn times_compare_with_times_only() {
        assert_eq!(comparison(CompareOperator::Less, Instant, Instant), Ok(Boolean));
        assert!(comparison(CompareOperator::Less, Instant, Duration).is_err());
        assert!(comparison(CompareOperator::Less, Boolean, Boolean).is_err());
        assert_eq!(comparison(CompareOperator::Greater, Number, Angle), Ok(Boolean));
    }

    #[test]
    fn dates_order_and_seasons_match() {
        assert_eq!(comparison(CompareOperator::Less, Date, Date), Ok(Boolean));
        assert!(comparison(CompareOperator::Less, Date, Number).is_err());
        assert_eq!(comparison(CompareOperator::Equal, Season, Season), Ok(Boolean));
        assert!(comparison(CompareOperator::Less, Season, Season).is_err());
        assert!(binary(BinaryOperator::Add, Date, Duration).is_err());
    }

    #[test]
    fn negation_rules() {
        assert_eq!(unary(UnaryOperator::Negate, Duration), Ok(Duration));
        assert!(unary(UnaryOperator::Negate, Instant).is_err());
        assert!(unary(UnaryOperator::Not, Number).is_err());
    }
}
