use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    ast::{Ast, NodeId},
    astro::{Horizon, Phase},
    error::EvalError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Evaluator},
            function::{
                core::{base_arg, outward_arg},
                solar::{crossing, day_length, edge},
            },
        },
        symbols::{Base, Function, Primitive},
        value::core::Value,
    },
    util::num::{delta_to_minutes, scale_delta},
};

/// Proportional hours in a day.
const HOURS_PER_DAY: f64 = 12.0;
/// Proportional minutes in a day.
const MINUTES_PER_DAY: f64 = 720.0;
/// Sun depression bounding the day of the `baal_hatanya` base.
const BAAL_HATANYA_DEPRESSION: f64 = 1.583;
/// Minutes after sunset ending the day of the `ateret_torah` base.
const ATERET_TORAH_MINUTES: i64 = 40;

fn out_of_range() -> EvalError {
    EvalError::invalid("proportional time out of range")
}

impl Evaluator<'_> {
    /// `proportional_hours(hours)`, `proportional_hours(hours, base)` or
    /// `proportional_hours(hours, start, end)`.
    ///
    /// Both ends of the day are resolved before anything is computed; if
    /// either fails, so does the call.
    pub(crate) fn proportional_hours(&mut self,
                                     ast: &Ast,
                                     hours: NodeId,
                                     day: &[NodeId])
                                     -> EvalResult<DateTime<Utc>> {
        let hours = self.eval(ast, hours)?.as_number("the hour count of `proportional_hours`")?;
        let (start, end) = match day {
            [] => self.day_bounds(Base::Gra)?,
            [base] => self.day_bounds(base_arg(ast, *base)?)?,
            [start, end] => {
                let start = self.eval(ast, *start)?.as_instant("the start of the day")?;
                (start, self.eval(ast, *end)?.as_instant("the end of the day")?)
            },
            _ => return Err(EvalError::invalid("`proportional_hours` takes at most 3 arguments")),
        };

        let span = end - start;
        if span <= TimeDelta::zero() {
            return Err(EvalError::invalid(format!("the day of `proportional_hours` ends before \
                                                   it starts ({start} to {end})")));
        }

        let offset = scale_delta(span, hours / HOURS_PER_DAY).ok_or_else(out_of_range)?;
        start.checked_add_signed(offset).ok_or_else(out_of_range)
    }

    /// `proportional_minutes(minutes, direction)`: `minutes` of a day
    /// divided into 720, before sunrise or after sunset.
    pub(crate) fn proportional_minutes(&mut self,
                                       ast: &Ast,
                                       minutes: NodeId,
                                       direction: NodeId)
                                       -> EvalResult<DateTime<Utc>> {
        let minutes = match self.eval(ast, minutes)? {
            Value::Duration(d) => delta_to_minutes(d).ok_or_else(out_of_range)?,
            other => other.as_number("the minute count of `proportional_minutes`")?,
        };
        let (phase, horizon) = outward_arg(ast, direction, Function::ProportionalMinutes)?;

        let offset = scale_delta(day_length(&self.solar, horizon)?, minutes / MINUTES_PER_DAY)
            .ok_or_else(out_of_range)?;
        let edge = edge(&self.solar, phase, horizon)?;
        let instant = match phase {
            Phase::Morning => edge.checked_sub_signed(offset),
            Phase::Evening => edge.checked_add_signed(offset),
        };
        instant.ok_or_else(out_of_range)
    }

    /// `midpoint(a, b)`. Fails if either operand fails.
    pub(crate) fn midpoint(&mut self, ast: &Ast, a: NodeId, b: NodeId) -> EvalResult<DateTime<Utc>> {
        let a = self.eval(ast, a)?.as_instant("the first argument of `midpoint`")?;
        let b = self.eval(ast, b)?.as_instant("the second argument of `midpoint`")?;
        let half = scale_delta(b - a, 0.5).ok_or_else(out_of_range)?;
        a.checked_add_signed(half).ok_or_else(out_of_range)
    }

    /// Start and end of the day `base` divides into proportional hours.
    pub fn day_bounds(&self, base: Base) -> EvalResult<(DateTime<Utc>, DateTime<Utc>)> {
        let sunrise = || self.primitive(Primitive::VisibleSunrise);
        let sunset = || self.primitive(Primitive::VisibleSunset);
        let widen = |extension: TimeDelta| -> EvalResult<_> {
            Ok((sunrise()?.checked_sub_signed(extension).ok_or_else(out_of_range)?,
                sunset()?.checked_add_signed(extension).ok_or_else(out_of_range)?))
        };
        let between = |depression: f64| -> EvalResult<_> {
            Ok((crossing(&self.solar, depression, Phase::Morning)?,
                crossing(&self.solar, depression, Phase::Evening)?))
        };

        match base {
            Base::Gra => Ok((sunrise()?, sunset()?)),
            Base::FixedMinutes(minutes) => {
                widen(TimeDelta::try_minutes(i64::from(minutes)).ok_or_else(out_of_range)?)
            },
            Base::ZmanisMinutes(minutes) => {
                let day = day_length(&self.solar, Horizon::Visible)?;
                widen(scale_delta(day, f64::from(minutes) / MINUTES_PER_DAY).ok_or_else(out_of_range)?)
            },
            Base::Degrees(tenths) => between(f64::from(tenths) / 10.0),
            Base::BaalHatanya => between(BAAL_HATANYA_DEPRESSION),
            Base::AteretTorah => {
                let extension = TimeDelta::try_minutes(ATERET_TORAH_MINUTES).ok_or_else(out_of_range)?;
                Ok((sunrise()?, sunset()?.checked_add_signed(extension).ok_or_else(out_of_range)?))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{compile, context::CalculationContext, registry::FormulaRegistry};

    fn context() -> CalculationContext {
        CalculationContext::new(NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
                                31.7683,
                                35.2137,
                                0.0,
                                chrono_tz::Asia::Jerusalem).unwrap()
    }

    fn eval(source: &str) -> EvalResult<DateTime<Utc>> {
        let snapshot = FormulaRegistry::new().snapshot();
        let ast = compile(source).ast.unwrap();
        Evaluator::new(context(), &snapshot, 8).eval(&ast, ast.root())?.as_instant("result")
    }

    #[test]
    fn proportional_hours_divides_sunrise_to_sunset() {
        let sunrise = eval("sunrise").unwrap();
        let sunset = eval("sunset").unwrap();
        let third = eval("proportional_hours(3)").unwrap();
        let expected = sunrise + (sunset - sunrise) / 4;
        assert!((third - expected).abs() <= TimeDelta::seconds(1));
        assert_eq!(eval("proportional_hours(6, gra)"), eval("midpoint(sunrise, sunset)"));
    }

    #[test]
    fn twelve_hour_day_gives_whole_hours() {
        let source = "proportional_hours(3, solar_noon - 6hr, solar_noon + 6hr)";
        let nine = eval(source).unwrap();
        let noon = eval("solar_noon").unwrap();
        assert_eq!(noon - nine, TimeDelta::hours(3));
    }

    #[test]
    fn fixed_minute_bases_widen_the_day() {
        let snapshot = FormulaRegistry::new().snapshot();
        let evaluator = Evaluator::new(context(), &snapshot, 8);
        let (gra_start, gra_end) = evaluator.day_bounds(Base::Gra).unwrap();
        let (mga_start, mga_end) = evaluator.day_bounds(Base::FixedMinutes(72)).unwrap();
        assert_eq!(gra_start - mga_start, TimeDelta::minutes(72));
        assert_eq!(mga_end - gra_end, TimeDelta::minutes(72));

        let (_, ateret_end) = evaluator.day_bounds(Base::AteretTorah).unwrap();
        assert_eq!(ateret_end - gra_end, TimeDelta::minutes(40));
    }

    #[test]
    fn reversed_days_are_invalid() {
        let result = eval("proportional_hours(3, sunset, sunrise)");
        assert!(matches!(result, Err(EvalError::InvalidOperation { .. })));
    }

    #[test]
    fn proportional_minutes_scale_with_the_day() {
        let sunrise = eval("sunrise").unwrap();
        let sunset = eval("sunset").unwrap();
        let alos = eval("proportional_minutes(72, before_sunrise)").unwrap();
        let expected = scale_delta(sunset - sunrise, 0.1).unwrap();
        assert!(((sunrise - alos) - expected).abs() <= TimeDelta::milliseconds(1));
        assert_eq!(eval("proportional_minutes(72min, before_sunrise)"), Ok(alos));
    }

    #[test]
    fn midpoint_fails_with_either_operand() {
        let failing = "midpoint(solar(80, before_sunrise), sunset)";
        assert!(matches!(eval(failing), Err(EvalError::AstronomicalEventNotReached { .. })));
        let failing = "midpoint(sunrise, solar(80, after_sunset))";
        assert!(eval(failing).is_err());
    }
}
