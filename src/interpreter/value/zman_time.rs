use std::fmt;

use chrono::{DateTime, NaiveTime, SubsecRound, Timelike, Utc};
use chrono_tz::Tz;

use crate::context::CalculationContext;

/// A formula result: a local time of day on the calculation date, rounded
/// to the nearest second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZmanTime {
    local: DateTime<Tz>,
}

impl ZmanTime {
    /// Rounds `instant` to the nearest second and converts it to the
    /// context's zone, or returns `None` when the result falls outside the
    /// context's calendar day in that zone.
    #[must_use]
    pub fn within_day(instant: DateTime<Utc>, context: &CalculationContext) -> Option<Self> {
        let local = instant.round_subsecs(0).with_timezone(&context.timezone());
        (local.date_naive() == context.date()).then_some(Self { local })
    }

    /// The result in the context's time zone.
    #[must_use]
    pub const fn local(&self) -> &DateTime<Tz> {
        &self.local
    }

    /// The result as a UTC instant.
    #[must_use]
    pub fn utc(&self) -> DateTime<Utc> {
        self.local.with_timezone(&Utc)
    }

    /// Wall-clock time of day.
    #[must_use]
    pub fn time(&self) -> NaiveTime {
        self.local.time()
    }

    /// Seconds since local midnight on the wall clock.
    #[must_use]
    pub fn seconds_from_midnight(&self) -> u32 {
        self.local.num_seconds_from_midnight()
    }
}

/// `HH:MM:SS` on the local wall clock.
impl fmt::Display for ZmanTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%H:%M:%S"))
    }
}
