use chrono::NaiveDate;
use chrono_tz::Tz;
use thiserror::Error;

use crate::astro::Observer;

/// A location or date that cannot be calculated for.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// Latitude outside [-90, 90] or not a number.
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    /// Longitude outside [-180, 180] or not a number.
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    /// Elevation that is not a finite number.
    #[error("elevation {0} is not a finite number of meters")]
    Elevation(f64),
}

/// Everything evaluation needs to know about where and when.
///
/// Read-only for the whole evaluation of a formula tree, including every
/// formula it references.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationContext {
    date:      NaiveDate,
    latitude:  f64,
    longitude: f64,
    elevation: f64,
    timezone:  Tz,
}

impl CalculationContext {
    /// Creates a context, checking that the coordinates are usable.
    ///
    /// Negative elevations are accepted and treated as sea level for horizon
    /// dip.
    ///
    /// ## Example
    /// ```
    /// use chrono::NaiveDate;
    /// use zmanim_dsl::context::{CalculationContext, ContextError};
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 21).unwrap();
    /// let tz = chrono_tz::Asia::Jerusalem;
    ///
    /// assert!(CalculationContext::new(date, 31.77, 35.21, 754.0, tz).is_ok());
    /// assert_eq!(CalculationContext::new(date, 91.0, 35.21, 0.0, tz),
    ///            Err(ContextError::Latitude(91.0)));
    /// ```
    pub fn new(date: NaiveDate,
               latitude: f64,
               longitude: f64,
               elevation: f64,
               timezone: Tz)
               -> Result<Self, ContextError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ContextError::Latitude(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ContextError::Longitude(longitude));
        }
        if !elevation.is_finite() {
            return Err(ContextError::Elevation(elevation));
        }
        Ok(Self { date,
                  latitude,
                  longitude,
                  elevation,
                  timezone })
    }

    /// The civil date results belong to.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Degrees, north positive.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Degrees, east positive.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Meters above sea level.
    #[must_use]
    pub const fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Zone results are reported in and whose calendar day bounds them.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The observer for solar calculations.
    #[must_use]
    pub const fn observer(&self) -> Observer {
        Observer { latitude:  self.latitude,
                   longitude: self.longitude,
                   elevation: self.elevation, }
    }

    /// Same place, different day.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 7).unwrap()
    }

    #[test]
    fn rejects_nan_coordinates() {
        let result = CalculationContext::new(date(), f64::NAN, 0.0, 0.0, Tz::UTC);
        assert!(matches!(result, Err(ContextError::Latitude(_))));
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        let result = CalculationContext::new(date(), 0.0, 181.0, 0.0, Tz::UTC);
        assert_eq!(result, Err(ContextError::Longitude(181.0)));
    }

    #[test]
    fn rejects_infinite_elevation() {
        let result = CalculationContext::new(date(), 0.0, 0.0, f64::INFINITY, Tz::UTC);
        assert!(matches!(result, Err(ContextError::Elevation(_))));
    }

    #[test]
    fn poles_are_valid_locations() {
        assert!(CalculationContext::new(date(), -90.0, 0.0, 0.0, Tz::UTC).is_ok());
    }
}
