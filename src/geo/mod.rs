// Geographic inputs: points, the circular region of interest and grid georeferencing

use std::fmt;

mod primatives;
mod projection;

pub use primatives::{Interval, Point2D, Region};
pub use projection::{GridProjection, ProjectionError, WGS84_EPSG};

/// Mean Earth radius (IUGG), meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    InvalidRadius(f64),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for GeoError {}

/// WGS84 point in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    lat_deg: f64,
    lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&lat_deg) {
            return Err(GeoError::LatitudeOutOfRange(lat_deg));
        }
        if !(-180.0..=180.0).contains(&lon_deg) {
            return Err(GeoError::LongitudeOutOfRange(lon_deg));
        }
        Ok(Self { lat_deg, lon_deg })
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_deg
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_deg
    }

    /// Great circle distance (haversine)
    pub fn distance_m(&self, lat_deg: f64, lon_deg: f64) -> f64 {
        let (phi1, phi2) = (self.lat_deg.to_radians(), lat_deg.to_radians());
        let dphi = phi2 - phi1;
        let dlambda = (lon_deg - self.lon_deg).to_radians();
        let a = (dphi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// (lat, lon) displaced by a local east/north offset in meters
    ///   equirectangular approximation, good to well under a pixel at ROI scales
    pub fn offset_m(&self, east_m: f64, north_m: f64) -> (f64, f64) {
        let dlat = (north_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = self.lat_deg.to_radians().cos().max(1e-12);
        let dlon = (east_m / (EARTH_RADIUS_M * cos_lat)).to_degrees();
        (self.lat_deg + dlat, self.lon_deg + dlon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat_deg, self.lon_deg)
    }
}

/// Circular buffer of `radius_m` around a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    center: GeoPoint,
    radius_m: f64,
}

impl RegionOfInterest {
    pub fn new(center: GeoPoint, radius_m: f64) -> Result<Self, GeoError> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(GeoError::InvalidRadius(radius_m));
        }
        Ok(Self { center, radius_m })
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn contains_lat_lon(&self, lat_deg: f64, lon_deg: f64) -> bool {
        self.center.distance_m(lat_deg, lon_deg) <= self.radius_m
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.contains_lat_lon(point.lat_deg, point.lon_deg)
    }

    /// Lon/lat bounding box of the circle
    pub fn bounds_lat_lon_deg(&self) -> Region<f64> {
        let dlat = (self.radius_m / EARTH_RADIUS_M).to_degrees();
        let south = (self.center.lat_deg - dlat).max(-90.0);
        let north = (self.center.lat_deg + dlat).min(90.0);
        let widest = self.center.lat_deg.abs().max(south.abs()).max(north.abs());
        let cos_lat = widest.to_radians().cos();
        if north >= 90.0 || south <= -90.0 || cos_lat < 1e-9 {
            return Region::new(-180.0, south, 180.0, north);
        }
        let dlon = (dlat / cos_lat).min(180.0);
        Region::new(
            self.center.lon_deg - dlon,
            south,
            self.center.lon_deg + dlon,
            north,
        )
    }

    /// Whether a lon/lat box overlaps the circle's bounding box, on either side of the
    /// antimeridian
    pub fn intersects_lat_lon_deg(&self, bounds: &Region<f64>) -> bool {
        let roi = self.bounds_lat_lon_deg();
        [-360.0, 0.0, 360.0].iter().any(|shift| {
            let (west, south, east, north) = bounds.as_tuple();
            roi.intersects(&Region::new(west + shift, south, east + shift, north))
        })
    }
}

impl fmt::Display for RegionOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROI({} r={}m)", self.center, self.radius_m)
    }
}
