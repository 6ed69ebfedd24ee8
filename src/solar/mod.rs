// Daylight window
//   Sunrise to sunset of one UTC date at a point, minute resolution.
//   Sunrise and sunset are each pinned to the requested UTC date, so west of
//   Greenwich sunset usually comes out before sunrise and is rolled a day forward.

use crate::geo::GeoPoint;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fmt;
use tracing::*;

pub mod noaa;

use noaa::{SunDirection, SUNRISE_ZENITH};

pub const WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%M:00";

#[derive(Debug, Clone, PartialEq)]
pub enum SolarError {
    DaylightUndefined { date: NaiveDate, lat_deg: f64 },
    InvalidDate(NaiveDate),
}

impl fmt::Display for SolarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for SolarError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaylightWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DaylightWindow {
    /// Window from raw transit instants: both truncated to the minute, sunset
    /// moved one day later if it does not come after sunrise.
    pub fn from_transits(sunrise: DateTime<Utc>, sunset: DateTime<Utc>) -> Option<Self> {
        let start = truncate_to_minute(sunrise)?;
        let mut end = truncate_to_minute(sunset)?;
        if end <= start {
            end += Duration::days(1);
        }
        Some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        *time >= self.start && *time < self.end
    }

    pub fn start_str(&self) -> String {
        self.start.format(WINDOW_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(WINDOW_FORMAT).to_string()
    }
}

impl fmt::Display for DaylightWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start_str(), self.end_str())
    }
}

fn truncate_to_minute(time: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let seconds = time.timestamp();
    DateTime::from_timestamp(seconds - seconds.rem_euclid(60), 0)
}

/// The date one day before today (UTC)
pub fn yesterday() -> NaiveDate {
    let today = Utc::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

/// Sunrise or sunset whose UTC date is `date`
pub fn sun_transit(
    point: &GeoPoint,
    date: NaiveDate,
    direction: SunDirection,
) -> Result<DateTime<Utc>, SolarError> {
    let transit = transit_instant(point, date, direction)?;
    let transit_date = transit.date_naive();
    if transit_date == date {
        return Ok(transit);
    }

    // Transit spilled into a neighbouring UTC date, use the neighbouring day's event instead
    let neighbour = if transit_date < date {
        date.succ_opt()
    } else {
        date.pred_opt()
    }
    .ok_or(SolarError::InvalidDate(date))?;
    trace!("{direction:?} at {point} spills to {transit_date}, using event of {neighbour}");
    transit_instant(point, neighbour, direction)
}

fn transit_instant(
    point: &GeoPoint,
    date: NaiveDate,
    direction: SunDirection,
) -> Result<DateTime<Utc>, SolarError> {
    let minutes = noaa::transit_minutes(
        date,
        point.lat_deg(),
        point.lon_deg(),
        SUNRISE_ZENITH,
        direction,
    )
    .ok_or(SolarError::DaylightUndefined {
        date,
        lat_deg: point.lat_deg(),
    })?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(SolarError::InvalidDate(date))?
        .and_utc();
    Ok(midnight + Duration::milliseconds((minutes * 60_000.0).round() as i64))
}

/// Daylight window of `reference_date` at `point`
pub fn compute_window(
    point: &GeoPoint,
    reference_date: NaiveDate,
) -> Result<DaylightWindow, SolarError> {
    let sunrise = sun_transit(point, reference_date, SunDirection::Rising)?;
    let sunset = sun_transit(point, reference_date, SunDirection::Setting)?;
    debug!("raw sunrise {sunrise}, raw sunset {sunset} at {point}");
    DaylightWindow::from_transits(sunrise, sunset).ok_or(SolarError::InvalidDate(reference_date))
}

/// Daylight window of yesterday, the most recent day with a complete archive
pub fn compute_window_for_yesterday(point: &GeoPoint) -> Result<DaylightWindow, SolarError> {
    compute_window(point, yesterday())
}
