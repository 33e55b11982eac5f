use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::{
    ast::{Ast, NodeId},
    astro::{Horizon, Phase, SolarDay},
    error::EvalError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Evaluator, not_reached},
            function::core::{direction_arg, outward_arg},
        },
        symbols::Function,
    },
    util::num::{delta_to_minutes, scale_delta},
};

/// Month and day of the March equinox used as the reference day of
/// `seasonal_solar`.
const EQUINOX: (u32, u32) = (3, 20);

impl Evaluator<'_> {
    /// `solar(angle, direction)`.
    pub(crate) fn solar_angle(&mut self, ast: &Ast, angle: NodeId, direction: NodeId) -> EvalResult<DateTime<Utc>> {
        let degrees = self.eval(ast, angle)?.as_number("the angle of `solar`")?;
        let direction = direction_arg(ast, direction, Function::Solar)?;
        crossing(&self.solar, degrees, direction.phase())
    }

    /// `seasonal_solar(angle, direction)`.
    ///
    /// Takes the distance between sunrise and the `angle` dawn (or sunset
    /// and the `angle` dusk) on the March equinox, scales it by today's day
    /// length over the equinox day length, and applies it to today's
    /// sunrise or sunset.
    pub(crate) fn seasonal_solar(&mut self,
                                 ast: &Ast,
                                 angle: NodeId,
                                 direction: NodeId)
                                 -> EvalResult<DateTime<Utc>> {
        let degrees = self.eval(ast, angle)?.as_number("the angle of `seasonal_solar`")?;
        let (phase, horizon) = outward_arg(ast, direction, Function::SeasonalSolar)?;

        let (month, day) = EQUINOX;
        let equinox_date = NaiveDate::from_ymd_opt(self.context.date().year(), month, day)
            .ok_or_else(|| EvalError::invalid("the equinox date is out of range"))?;
        let equinox = SolarDay::local(equinox_date, self.context.observer(), self.context.timezone());

        let equinox_offset = crossing(&equinox, degrees, phase)? - edge(&equinox, phase, horizon)?;
        let equinox_day = day_length(&equinox, horizon)?;
        let today = day_length(&self.solar, horizon)?;

        let ratio = match (delta_to_minutes(today), delta_to_minutes(equinox_day)) {
            (Some(today), Some(equinox)) if equinox > 0.0 => today / equinox,
            _ => return Err(EvalError::invalid("the equinox day has no length at this location")),
        };
        let offset = scale_delta(equinox_offset, ratio)
            .ok_or_else(|| EvalError::invalid("seasonal offset out of range"))?;

        edge(&self.solar, phase, horizon)?
            .checked_add_signed(offset)
            .ok_or_else(|| EvalError::invalid("seasonal offset out of range"))
    }
}

/// When the sun is `degrees` below the horizon on `phase` of `day`.
pub(crate) fn crossing(day: &SolarDay, degrees: f64, phase: Phase) -> EvalResult<DateTime<Utc>> {
    day.crossing(degrees, phase).ok_or_else(|| {
        let side = match phase {
            Phase::Morning => "morning",
            Phase::Evening => "evening",
        };
        not_reached(format!("{degrees}° below the horizon ({side})"))
    })
}

/// Sunrise for the morning phase, sunset for the evening.
pub(crate) fn edge(day: &SolarDay, phase: Phase, horizon: Horizon) -> EvalResult<DateTime<Utc>> {
    match phase {
        Phase::Morning => day.sunrise(horizon).ok_or_else(|| not_reached("sunrise")),
        Phase::Evening => day.sunset(horizon).ok_or_else(|| not_reached("sunset")),
    }
}

pub(crate) fn day_length(day: &SolarDay, horizon: Horizon) -> EvalResult<chrono::TimeDelta> {
    day.day_length(horizon).ok_or_else(|| not_reached("sunrise or sunset"))
}
