use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

use crate::{
    ast::month_name, error::EvalError, interpreter::evaluator::core::EvalResult,
    util::num::delta_to_minutes,
};

/// Static sort of a value, as tracked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A point in time.
    Instant,
    /// A signed span of time.
    Duration,
    /// Degrees.
    Angle,
    /// A unitless number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// A day of the year, such as `21-May` or `date`.
    Date,
    /// `spring`, `summer`, `autumn` or `winter`.
    Season,
}

impl ValueKind {
    /// Whether arithmetic treats the kind as a plain number.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Angle)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Self::Instant => "time",
                        Self::Duration => "duration",
                        Self::Angle => "angle",
                        Self::Number => "number",
                        Self::Boolean => "boolean",
                        Self::Date => "date",
                        Self::Season => "season",
                    })
    }
}

/// A day of the year, independent of the year. Orders by month, then day,
/// so `29-Feb` sorts between `28-Feb` and `1-Mar` in every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day:   u32,
}

impl MonthDay {
    /// Creates a month-day, rejecting days the month never has.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::interpreter::value::core::MonthDay;
    ///
    /// assert!(MonthDay::new(2, 29).is_ok());
    /// assert!(MonthDay::new(4, 31).is_err());
    /// assert!(MonthDay::new(5, 21).unwrap() < MonthDay::new(7, 10).unwrap());
    /// ```
    ///
    /// # Errors
    /// `InvalidOperation` for a day that exists in no year.
    pub fn new(month: u32, day: u32) -> EvalResult<Self> {
        // 2024 is a leap year, so every day any year has exists in it.
        NaiveDate::from_ymd_opt(2024, month, day).map(|_| Self { month, day })
                                                 .ok_or_else(|| {
                                                     EvalError::invalid(format!("{day}-{} is not a day of the year",
                                                                                month_name(month)))
                                                 })
    }

    /// The month and day of `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self { month: date.month(),
               day:   date.day(), }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, month_name(self.month))
    }
}

/// Astronomical season of a date in the observer's hemisphere, by whole
/// months: March to May is spring in the north and autumn in the south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    /// `spring`
    Spring,
    /// `summer`
    Summer,
    /// `autumn`, also written `fall`
    Autumn,
    /// `winter`
    Winter,
}

impl Season {
    /// Resolves a season name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "spring" => Self::Spring,
            "summer" => Self::Summer,
            "autumn" | "fall" => Self::Autumn,
            "winter" => Self::Winter,
            _ => return None,
        })
    }

    /// The season of `month` at `latitude`.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::interpreter::value::core::Season;
    ///
    /// assert_eq!(Season::of(7, 31.8), Season::Summer);
    /// assert_eq!(Season::of(7, -33.9), Season::Winter);
    /// assert_eq!(Season::of(12, 0.0), Season::Winter);
    /// ```
    #[must_use]
    pub fn of(month: u32, latitude: f64) -> Self {
        let northern = match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Autumn,
            _ => Self::Winter,
        };
        if latitude >= 0.0 { northern } else { northern.opposite() }
    }

    const fn opposite(self) -> Self {
        match self {
            Self::Spring => Self::Autumn,
            Self::Summer => Self::Winter,
            Self::Autumn => Self::Spring,
            Self::Winter => Self::Summer,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Self::Spring => "spring",
                        Self::Summer => "summer",
                        Self::Autumn => "autumn",
                        Self::Winter => "winter",
                    })
    }
}

/// Represents a runtime value in the evaluator.
///
/// Formulas only ever return [`Value::Instant`] at their root; the other
/// variants live inside arithmetic and `if` conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// An absolute point in time.
    Instant(DateTime<Utc>),
    /// A signed span of time, e.g. `72min`.
    Duration(TimeDelta),
    /// Degrees, e.g. `16.1deg`.
    Angle(f64),
    /// A unitless number.
    Number(f64),
    /// Produced by comparisons and logical operators.
    Bool(bool),
    /// A day of the year.
    MonthDay(MonthDay),
    /// A season.
    Season(Season),
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Instant(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Self {
        Self::Duration(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl Value {
    /// The static kind of the value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Instant(_) => ValueKind::Instant,
            Self::Duration(_) => ValueKind::Duration,
            Self::Angle(_) => ValueKind::Angle,
            Self::Number(_) => ValueKind::Number,
            Self::Bool(_) => ValueKind::Boolean,
            Self::MonthDay(_) => ValueKind::Date,
            Self::Season(_) => ValueKind::Season,
        }
    }

    /// Unwraps an instant.
    ///
    /// # Errors
    /// `InvalidOperation` for any other kind.
    pub fn as_instant(&self, what: &str) -> EvalResult<DateTime<Utc>> {
        match self {
            Self::Instant(t) => Ok(*t),
            other => Err(EvalError::invalid(format!("{what} must be a time, found a {}",
                                                    other.kind()))),
        }
    }

    /// Unwraps a plain number or angle as degrees.
    ///
    /// # Errors
    /// `InvalidOperation` for any other kind.
    pub fn as_number(&self, what: &str) -> EvalResult<f64> {
        match self {
            Self::Number(n) | Self::Angle(n) => Ok(*n),
            other => Err(EvalError::invalid(format!("{what} must be a number, found a {}",
                                                    other.kind()))),
        }
    }

    /// Unwraps a boolean.
    ///
    /// # Errors
    /// `InvalidOperation` for any other kind.
    pub fn as_bool(&self, what: &str) -> EvalResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(EvalError::invalid(format!("{what} must be a condition, found a {}",
                                                    other.kind()))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%SZ")),
            Self::Duration(d) => match delta_to_minutes(*d) {
                Some(minutes) => write!(f, "{minutes}min"),
                None => write!(f, "{d}"),
            },
            Self::Angle(a) => write!(f, "{a}deg"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::MonthDay(d) => write!(f, "{d}"),
            Self::Season(s) => write!(f, "{s}"),
        }
    }
}
