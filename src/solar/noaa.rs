// NOAA solar calculator
//   https://gml.noaa.gov/grad/solcalc/calcdetails.html
//   All angles in degrees unless the name says otherwise

use chrono::{Datelike, NaiveDate};

/// Zenith of the sun's center at standard sunrise/sunset:
///   90 deg + 16' apparent radius + 34' standard refraction
pub const SUNRISE_ZENITH: f64 = 90.0 + 50.0 / 60.0;

/// Beyond this the hour angle becomes numerically unstable
const MAX_LATITUDE: f64 = 89.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunDirection {
    Rising,
    Setting,
}

/// Julian day at 00:00 UTC of `date`
pub fn julian_day(date: NaiveDate) -> f64 {
    let (mut y, mut m) = (date.year() as f64, date.month() as f64);
    let d = date.day() as f64;
    if m <= 2.0 {
        y -= 1.0;
        m += 12.0;
    }
    let a = (y / 100.0).trunc();
    let b = 2.0 - a + (a / 4.0).trunc();
    (365.25 * (y + 4716.0)).trunc() + (30.6001 * (m + 1.0)).trunc() + d + b - 1524.5
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

fn julian_day_from_century(t: f64) -> f64 {
    t * 36525.0 + 2451545.0
}

fn geom_mean_long_sun(t: f64) -> f64 {
    (280.46646 + t * (36000.76983 + 0.0003032 * t)).rem_euclid(360.0)
}

fn geom_mean_anomaly_sun(t: f64) -> f64 {
    357.52911 + t * (35999.05029 - 0.0001537 * t)
}

fn eccentricity_earth_orbit(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + 0.0000001267 * t)
}

fn sun_eq_of_center(t: f64) -> f64 {
    let m = geom_mean_anomaly_sun(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + 0.000014 * t))
        + (2.0 * m).sin() * (0.019993 - 0.000101 * t)
        + (3.0 * m).sin() * 0.000289
}

fn sun_apparent_long(t: f64) -> f64 {
    let true_long = geom_mean_long_sun(t) + sun_eq_of_center(t);
    let omega = 125.04 - 1934.136 * t;
    true_long - 0.00569 - 0.00478 * omega.to_radians().sin()
}

fn obliquity_correction(t: f64) -> f64 {
    let seconds = 21.448 - t * (46.815 + t * (0.00059 - t * 0.001813));
    let mean = 23.0 + (26.0 + seconds / 60.0) / 60.0;
    let omega = 125.04 - 1934.136 * t;
    mean + 0.00256 * omega.to_radians().cos()
}

pub fn sun_declination(t: f64) -> f64 {
    let e = obliquity_correction(t).to_radians();
    let lambda = sun_apparent_long(t).to_radians();
    (e.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time, minutes
pub fn equation_of_time(t: f64) -> f64 {
    let l0 = geom_mean_long_sun(t).to_radians();
    let e = eccentricity_earth_orbit(t);
    let m = geom_mean_anomaly_sun(t).to_radians();
    let y = (obliquity_correction(t).to_radians() / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * e * m.sin() + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * e * e * (2.0 * m).sin();
    4.0 * eq.to_degrees()
}

/// Hour angle (degrees) at which the sun reaches `zenith`, `None` if it never does
pub fn hour_angle(
    latitude: f64,
    declination: f64,
    zenith: f64,
    direction: SunDirection,
) -> Option<f64> {
    let (lat, dec) = (latitude.to_radians(), declination.to_radians());
    let cos_h = (zenith.to_radians().cos() - lat.sin() * dec.sin()) / (lat.cos() * dec.cos());
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }
    let h = cos_h.acos().to_degrees();
    Some(match direction {
        SunDirection::Rising => h,
        SunDirection::Setting => -h,
    })
}

fn transit_offset_minutes(longitude: f64, hour_angle: f64, t: f64) -> f64 {
    let delta = -longitude - hour_angle;
    let offset = delta * 4.0 - equation_of_time(t);
    if offset < -720.0 {
        offset + 1440.0
    } else {
        offset
    }
}

/// Minutes after 00:00 UTC of `date` at which the sun crosses `zenith`.
///   May fall outside [0, 1440) for longitudes far from Greenwich.
pub fn transit_minutes(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    zenith: f64,
    direction: SunDirection,
) -> Option<f64> {
    let latitude = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    // First estimate at 00:00 UTC
    let t = julian_century(julian_day(date));
    let h = hour_angle(latitude, sun_declination(t), zenith, direction)?;
    let first = 720.0 + transit_offset_minutes(longitude, h, t);

    // Refine with the sun's position at the estimate
    let t = julian_century(julian_day_from_century(t) + first / 1440.0);
    let h = hour_angle(latitude, sun_declination(t), zenith, direction)?;
    Some(720.0 + transit_offset_minutes(longitude, h, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn julian_day_of_j2000() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(julian_day(date), 2451544.5);
    }

    #[test]
    fn declination_at_solstice() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let t = julian_century(julian_day(date) + 0.5);
        assert!((sun_declination(t) - 23.44).abs() < 0.05);
    }

    #[test]
    fn equation_of_time_early_november() {
        // Close to the annual maximum of ~16.4 minutes
        let date = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
        let t = julian_century(julian_day(date) + 0.5);
        assert!((equation_of_time(t) - 16.4).abs() < 0.3);
    }

    #[test]
    fn polar_night_has_no_hour_angle() {
        assert!(hour_angle(80.0, -23.4, SUNRISE_ZENITH, SunDirection::Rising).is_none());
        assert!(hour_angle(80.0, 23.4, SUNRISE_ZENITH, SunDirection::Setting).is_none());
        assert!(hour_angle(40.0, 0.0, SUNRISE_ZENITH, SunDirection::Rising).is_some());
    }
}
