//! Solar position equations of the NOAA solar calculator.
//!
//! Angles are in degrees unless the name says otherwise; times are minutes
//! after 00:00 UTC of the calculation date.

use chrono::{Datelike, NaiveDate};

/// Julian day of the J2000.0 epoch.
const J2000: f64 = 2_451_545.0;
/// Julian day of 0001-01-01 00:00 UTC, proleptic Gregorian, minus one day.
const JD_BEFORE_CE: f64 = 1_721_424.5;

/// Julian day at 00:00 UTC of `date`.
///
/// ## Example
/// ```
/// use chrono::NaiveDate;
/// use zmanim_dsl::astro::noaa::julian_day;
///
/// let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
/// assert_eq!(julian_day(date), 2_451_544.5);
/// ```
#[must_use]
pub fn julian_day(date: NaiveDate) -> f64 {
    JD_BEFORE_CE + f64::from(date.num_days_from_ce())
}

/// Julian centuries since J2000.0.
fn julian_century(julian_day: f64) -> f64 {
    (julian_day - J2000) / 36_525.0
}

fn geometric_mean_longitude(t: f64) -> f64 {
    t.mul_add(36_000.769_83 + 0.000_303_2 * t, 280.466_46).rem_euclid(360.0)
}

fn geometric_mean_anomaly(t: f64) -> f64 {
    t.mul_add(35_999.050_29 - 0.000_153_7 * t, 357.529_11)
}

fn orbit_eccentricity(t: f64) -> f64 {
    0.016_708_634 - t * 0.000_000_126_7f64.mul_add(t, 0.000_042_037)
}

fn equation_of_center(t: f64) -> f64 {
    let m = geometric_mean_anomaly(t).to_radians();
    m.sin() * (1.914_602 - t * 0.000_014f64.mul_add(t, 0.004_817))
    + (2.0 * m).sin() * 0.000_101f64.mul_add(-t, 0.019_993)
    + (3.0 * m).sin() * 0.000_289
}

fn apparent_longitude(t: f64) -> f64 {
    let true_longitude = geometric_mean_longitude(t) + equation_of_center(t);
    let omega = 1_934.136f64.mul_add(-t, 125.04).to_radians();
    0.004_78f64.mul_add(-omega.sin(), true_longitude - 0.005_69)
}

fn mean_obliquity(t: f64) -> f64 {
    let seconds = 21.448 - t * (46.815 + t * 0.001_813f64.mul_add(-t, 0.000_59));
    23.0 + (26.0 + seconds / 60.0) / 60.0
}

fn obliquity_correction(t: f64) -> f64 {
    let omega = 1_934.136f64.mul_add(-t, 125.04).to_radians();
    0.002_56f64.mul_add(omega.cos(), mean_obliquity(t))
}

/// Solar declination.
fn declination(t: f64) -> f64 {
    let epsilon = obliquity_correction(t).to_radians();
    let lambda = apparent_longitude(t).to_radians();
    (epsilon.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time in minutes.
fn equation_of_time(t: f64) -> f64 {
    let epsilon = obliquity_correction(t).to_radians();
    let l0 = geometric_mean_longitude(t).to_radians();
    let e = orbit_eccentricity(t);
    let m = geometric_mean_anomaly(t).to_radians();
    let y = (epsilon / 2.0).tan().powi(2);

    let value = y * (2.0 * l0).sin() - 2.0 * e * m.sin()
                + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
                - 0.5 * y * y * (4.0 * l0).sin()
                - 1.25 * e * e * (2.0 * m).sin();
    4.0 * value.to_degrees()
}

/// Hour angle at which the sun's center reaches `zenith`, or `None` when the
/// sun never gets there on this day.
fn hour_angle(latitude: f64, declination: f64, zenith: f64) -> Option<f64> {
    let lat = latitude.to_radians();
    let dec = declination.to_radians();
    let cos_ha = zenith.to_radians().cos() / (lat.cos() * dec.cos()) - lat.tan() * dec.tan();
    (-1.0..=1.0).contains(&cos_ha).then(|| cos_ha.acos().to_degrees())
}

/// Minutes after 00:00 UTC of the sun's transit.
#[must_use]
pub fn solar_noon_minutes(julian_day: f64, longitude: f64) -> f64 {
    let first = 720.0 - 4.0 * longitude - equation_of_time(julian_century(julian_day - longitude / 360.0));
    let t = julian_century(julian_day + first / 1_440.0);
    720.0 - 4.0 * longitude - equation_of_time(t)
}

/// Minutes after 00:00 UTC at which the sun's center reaches `zenith`,
/// rising when `rising` is set and setting otherwise.
///
/// The first pass uses the sun's position at 00:00 UTC; a second pass
/// recomputes it at the estimated time of the event.
#[must_use]
pub fn crossing_minutes(julian_day: f64,
                        latitude: f64,
                        longitude: f64,
                        zenith: f64,
                        rising: bool)
                        -> Option<f64> {
    let pass = |t: f64| {
        let ha = hour_angle(latitude, declination(t), zenith)?;
        let delta = if rising { longitude + ha } else { longitude - ha };
        Some(720.0 - 4.0 * delta - equation_of_time(t))
    };

    let estimate = pass(julian_century(julian_day))?;
    pass(julian_century(julian_day + estimate / 1_440.0))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn declination_is_near_zero_at_equinox() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap_or_default();
        let t = julian_century(julian_day(date) + 0.5);
        assert_abs_diff_eq!(declination(t), 0.0, epsilon = 0.5);
    }

    #[test]
    fn declination_peaks_at_solstice() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap_or_default();
        let t = julian_century(julian_day(date) + 0.5);
        assert_abs_diff_eq!(declination(t), 23.44, epsilon = 0.05);
    }

    #[test]
    fn equation_of_time_matches_almanac() {
        // Early November the sun runs about 16.4 minutes fast.
        let date = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap_or_default();
        let t = julian_century(julian_day(date) + 0.5);
        assert_abs_diff_eq!(equation_of_time(t), 16.4, epsilon = 0.2);
    }

    #[test]
    fn greenwich_noon_is_near_midday() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 15).unwrap_or_default();
        let noon = solar_noon_minutes(julian_day(date), 0.0);
        assert_abs_diff_eq!(noon, 720.0, epsilon = 1.0);
    }

    #[test]
    fn polar_night_has_no_sunrise() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap_or_default();
        assert!(crossing_minutes(julian_day(date), 78.22, 15.65, 90.833, true).is_none());
    }
}
