use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::util::num::minutes_to_delta;

/// Solar position equations.
///
/// A compact port of the NOAA solar calculator, accurate to about a minute
/// for latitudes within the polar circles.
pub mod noaa;

/// Depression of the sun's center at visible sunrise and sunset on a flat
/// horizon: 34' of refraction plus the 16' semidiameter.
pub const VISIBLE_HORIZON_DEPRESSION: f64 = 0.833;

/// Which horizon a sunrise or sunset is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizon {
    /// The upper limb appears over the horizon, corrected for refraction and
    /// the observer's elevation.
    Visible,
    /// The sun's center crosses the mathematical horizon.
    Geometric,
}

/// Morning or evening side of the solar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before solar noon.
    Morning,
    /// After solar noon.
    Evening,
}

/// Where the sun is observed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Degrees, north positive.
    pub latitude:  f64,
    /// Degrees, east positive.
    pub longitude: f64,
    /// Meters above sea level.
    pub elevation: f64,
}

/// Extra horizon dip seen from `elevation` meters above the surrounding
/// terrain.
///
/// ## Example
/// ```
/// use zmanim_dsl::astro::elevation_dip;
///
/// assert_eq!(elevation_dip(0.0), 0.0);
/// assert!((elevation_dip(100.0) - 0.347).abs() < 1e-9);
/// ```
#[must_use]
pub fn elevation_dip(elevation: f64) -> f64 {
    if elevation > 0.0 { 0.0347 * elevation.sqrt() } else { 0.0 }
}

/// Solar events of one civil date at one observer.
///
/// Every time is an absolute UTC instant. Events the sun does not reach on
/// this date (polar day and night, deep twilight in high-latitude summer)
/// come back as `None`.
#[derive(Debug, Clone, Copy)]
pub struct SolarDay {
    date:       NaiveDate,
    observer:   Observer,
    julian_day: f64,
}

impl SolarDay {
    /// Prepares the calculator for the UTC day `date` at `observer`.
    ///
    /// Events are those of the solar day whose transit is nearest to noon
    /// UTC on `date`. Use [`SolarDay::local`] for a civil date kept in a
    /// time zone.
    #[must_use]
    pub fn new(date: NaiveDate, observer: Observer) -> Self {
        Self { date,
               observer,
               julian_day: noaa::julian_day(date) }
    }

    /// Prepares the calculator for the civil `date` of `timezone`.
    ///
    /// Picks the UTC day whose transit falls on `date` in `timezone`. Where
    /// the zone runs far ahead of or behind the observer's meridian, as on
    /// Kiritimati at UTC+14, that is the day before or after `date`.
    ///
    /// ## Example
    /// ```
    /// use chrono::{Datelike, NaiveDate};
    /// use zmanim_dsl::astro::{Observer, SolarDay};
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 21).unwrap();
    /// let kiritimati = Observer { latitude: 1.87, longitude: -157.4, elevation: 0.0 };
    /// let tz = chrono_tz::Pacific::Kiritimati;
    ///
    /// let noon = SolarDay::local(date, kiritimati, tz).solar_noon().unwrap();
    /// assert_eq!(noon.with_timezone(&tz).day(), 21);
    /// ```
    #[must_use]
    pub fn local(date: NaiveDate, observer: Observer, timezone: Tz) -> Self {
        let on_date = |day: &Self| {
            day.solar_noon()
               .is_some_and(|noon| noon.with_timezone(&timezone).date_naive() == date)
        };

        [Some(date), date.pred_opt(), date.succ_opt()].into_iter()
                                                      .flatten()
                                                      .map(|base| Self::new(base, observer))
                                                      .find(on_date)
                                                      .unwrap_or_else(|| Self::new(date, observer))
    }

    /// The UTC day the equations are anchored to.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// The observer.
    #[must_use]
    pub const fn observer(&self) -> Observer {
        self.observer
    }

    /// Depression of the sun's center below the mathematical horizon at
    /// sunrise and sunset over `horizon`.
    #[must_use]
    pub fn horizon_depression(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Visible => VISIBLE_HORIZON_DEPRESSION + elevation_dip(self.observer.elevation),
            Horizon::Geometric => 0.0,
        }
    }

    /// The sun's transit.
    #[must_use]
    pub fn solar_noon(&self) -> Option<DateTime<Utc>> {
        self.at_minutes(noaa::solar_noon_minutes(self.julian_day, self.observer.longitude))
    }

    /// When the sun's center is `depression` degrees below the horizon on
    /// the given side of the day. Negative depressions lie above the
    /// horizon.
    #[must_use]
    pub fn crossing(&self, depression: f64, phase: Phase) -> Option<DateTime<Utc>> {
        let minutes = noaa::crossing_minutes(self.julian_day,
                                             self.observer.latitude,
                                             self.observer.longitude,
                                             90.0 + depression,
                                             phase == Phase::Morning)?;
        self.at_minutes(minutes)
    }

    /// Sunrise over `horizon`.
    #[must_use]
    pub fn sunrise(&self, horizon: Horizon) -> Option<DateTime<Utc>> {
        self.crossing(self.horizon_depression(horizon), Phase::Morning)
    }

    /// Sunset over `horizon`.
    #[must_use]
    pub fn sunset(&self, horizon: Horizon) -> Option<DateTime<Utc>> {
        self.crossing(self.horizon_depression(horizon), Phase::Evening)
    }

    /// Sunrise to sunset over `horizon`.
    #[must_use]
    pub fn day_length(&self, horizon: Horizon) -> Option<TimeDelta> {
        Some(self.sunset(horizon)? - self.sunrise(horizon)?)
    }

    fn at_minutes(&self, minutes: f64) -> Option<DateTime<Utc>> {
        let midnight = self.date.and_time(NaiveTime::default()).and_utc();
        midnight.checked_add_signed(minutes_to_delta(minutes)?)
    }
}
