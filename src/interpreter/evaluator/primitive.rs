use chrono::{DateTime, Datelike, TimeDelta, Utc};

use crate::{
    astro::Horizon,
    error::EvalError,
    interpreter::{
        evaluator::core::{EvalResult, Evaluator, not_reached},
        symbols::{ConditionVar, Primitive, Symbol},
        value::core::{MonthDay, Season, Value},
    },
};

impl Evaluator<'_> {
    /// Evaluates a bare name.
    pub(crate) fn eval_identifier(&self, name: &str) -> EvalResult<Value> {
        match Symbol::lookup(name) {
            Some(Symbol::Primitive(primitive)) => self.primitive(primitive).map(Value::Instant),
            Some(Symbol::Condition(var)) => self.condition(var),
            Some(Symbol::Season(season)) => Ok(Value::Season(season)),
            Some(Symbol::Direction(_) | Symbol::Base(_)) => {
                Err(EvalError::invalid(format!("`{name}` is a keyword, not a value")))
            },
            None => Err(EvalError::invalid(format!("unknown name `{name}`"))),
        }
    }

    /// Computes an astronomical primitive for the context's date.
    ///
    /// # Errors
    /// [`EvalError::AstronomicalEventNotReached`] when the sun does not get
    /// there today.
    pub fn primitive(&self, primitive: Primitive) -> EvalResult<DateTime<Utc>> {
        let instant = match primitive {
            Primitive::VisibleSunrise => self.solar.sunrise(Horizon::Visible),
            Primitive::VisibleSunset => self.solar.sunset(Horizon::Visible),
            Primitive::GeometricSunrise => self.solar.sunrise(Horizon::Geometric),
            Primitive::GeometricSunset => self.solar.sunset(Horizon::Geometric),
            Primitive::SolarNoon => self.solar.solar_noon(),
            Primitive::SolarMidnight => {
                self.solar
                    .solar_noon()
                    .and_then(|noon| noon.checked_sub_signed(TimeDelta::try_hours(12)?))
            },
            twilight => twilight.twilight()
                                .and_then(|(depression, phase)| self.solar.crossing(depression, phase)),
        };

        instant.ok_or_else(|| not_reached(primitive.to_string()))
    }

    fn condition(&self, var: ConditionVar) -> EvalResult<Value> {
        let date = self.context.date();
        let value = match var {
            ConditionVar::Latitude => self.context.latitude(),
            ConditionVar::Longitude => self.context.longitude(),
            ConditionVar::Elevation => self.context.elevation(),
            ConditionVar::DayLength => {
                return self.solar
                           .day_length(Horizon::Visible)
                           .map(Value::Duration)
                           .ok_or_else(|| not_reached("sunrise or sunset"));
            },
            ConditionVar::Month => f64::from(date.month()),
            ConditionVar::Day => f64::from(date.day()),
            ConditionVar::DayOfYear => f64::from(date.ordinal()),
            ConditionVar::Date => return Ok(Value::MonthDay(MonthDay::of(date))),
            ConditionVar::Season => {
                return Ok(Value::Season(Season::of(date.month(), self.context.latitude())));
            },
        };
        Ok(Value::Number(value))
    }
}
