use super::{Interval, Region};
use proj4rs::errors::Error as Proj4Error;
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

pub const WGS84_EPSG: u16 = 4326;

const EDGE_EPSILON: f64 = 1e-9;

// Grid georeference
//   origin is the outer corner of the top-left pixel, y grows downwards in pixel space
//   EPSG:4326 grids are kept in degrees and never go through proj4rs

#[derive(Debug)]
pub enum ProjectionError {
    Proj4Error(Proj4Error),
    InvalidOrigin((f64, f64)),
    InvalidScale((f64, f64)),
    NotFinite((f64, f64)),
}

impl From<Proj4Error> for ProjectionError {
    fn from(e: Proj4Error) -> Self {
        ProjectionError::Proj4Error(e)
    }
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for ProjectionError {}

#[derive(Clone, Debug)]
pub struct GridProjection {
    pub epsg: u16,
    pub origin: (f64, f64),
    pub pixel_scale: (f64, f64),
    proj: Option<(Proj, Proj)>, // (grid, wgs84), None for geographic grids
}

impl GridProjection {
    pub fn new(
        epsg: u16,
        origin: (f64, f64),
        pixel_scale: (f64, f64),
    ) -> Result<Self, ProjectionError> {
        if !origin.0.is_finite() || !origin.1.is_finite() {
            return Err(ProjectionError::InvalidOrigin(origin));
        }
        if !pixel_scale.0.is_normal()
            || !pixel_scale.1.is_normal()
            || pixel_scale.0 < 0.0
            || pixel_scale.1 < 0.0
        {
            return Err(ProjectionError::InvalidScale(pixel_scale));
        }
        let proj = if epsg == WGS84_EPSG {
            None
        } else {
            Some((
                Proj::from_epsg_code(epsg)?,
                Proj::from_epsg_code(WGS84_EPSG)?,
            ))
        };
        Ok(Self {
            epsg,
            origin,
            pixel_scale,
            proj,
        })
    }

    /// Geographic grid with `origin` at (west, north) in degrees
    pub fn lat_lon_deg(
        west: f64,
        north: f64,
        deg_per_pixel: (f64, f64),
    ) -> Result<Self, ProjectionError> {
        Self::new(WGS84_EPSG, (west, north), deg_per_pixel)
    }

    pub fn is_geographic(&self) -> bool {
        self.proj.is_none()
    }

    pub fn same_grid(&self, other: &GridProjection) -> bool {
        self.epsg == other.epsg
            && self.origin == other.origin
            && self.pixel_scale == other.pixel_scale
    }

    /// Same grid with the top-left corner moved to pixel (`col`, `row`)
    pub fn shifted(&self, col: u32, row: u32) -> Self {
        Self {
            origin: (
                self.origin.0 + col as f64 * self.pixel_scale.0,
                self.origin.1 - row as f64 * self.pixel_scale.1,
            ),
            ..self.clone()
        }
    }

    pub fn pixel_center_lat_lon_deg(
        &self,
        col: u32,
        row: u32,
    ) -> Result<(f64, f64), ProjectionError> {
        self.transform_into_lat_lon_deg(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Fractional pixel coordinates (u, v) -> (lat, lon) degrees
    pub fn transform_into_lat_lon_deg(
        &self,
        u: f64,
        v: f64,
    ) -> Result<(f64, f64), ProjectionError> {
        let x = self.origin.0 + u * self.pixel_scale.0;
        let y = self.origin.1 - v * self.pixel_scale.1;
        match &self.proj {
            None => Ok((y, x)),
            Some((grid, wgs84)) => {
                let mut point = (x, y, 0.0);
                transform(grid, wgs84, &mut point)?;
                let (lat, lon) = (point.1.to_degrees(), point.0.to_degrees());
                if lat.is_finite() && lon.is_finite() {
                    Ok((lat, lon))
                } else {
                    Err(ProjectionError::NotFinite((u, v)))
                }
            }
        }
    }

    /// (lat, lon) degrees -> fractional pixel coordinates (u, v)
    pub fn transform_from_lat_lon_deg(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<(f64, f64), ProjectionError> {
        let (x, y) = match &self.proj {
            None => (lon, lat),
            Some((grid, wgs84)) => {
                let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
                transform(wgs84, grid, &mut point)?;
                (point.0, point.1)
            }
        };
        let u = (x - self.origin.0) / self.pixel_scale.0;
        let v = (self.origin.1 - y) / self.pixel_scale.1;
        if u.is_finite() && v.is_finite() {
            Ok((u, v))
        } else {
            Err(ProjectionError::NotFinite((lat, lon)))
        }
    }

    /// Lon/lat bounding box of a grid with the given dimensions
    pub fn bounds_lat_lon_deg(
        &self,
        dimensions: (u32, u32),
    ) -> Result<Region<f64>, ProjectionError> {
        let (w, h) = (dimensions.0 as f64, dimensions.1 as f64);
        let mut lats = Vec::with_capacity(8);
        let mut lons = Vec::with_capacity(8);
        for (u, v) in [
            (0.0, 0.0),
            (w / 2.0, 0.0),
            (w, 0.0),
            (w, h / 2.0),
            (w, h),
            (w / 2.0, h),
            (0.0, h),
            (0.0, h / 2.0),
        ] {
            let (lat, lon) = self.transform_into_lat_lon_deg(u, v)?;
            lats.push(lat);
            lons.push(lon);
        }
        // Only reachable with zero corners, which the fixed list above rules out
        let x = Interval::enclosing(lons).ok_or(ProjectionError::NotFinite((w, h)))?;
        let y = Interval::enclosing(lats).ok_or(ProjectionError::NotFinite((w, h)))?;
        Ok(Region { x, y })
    }

    /// Pixel window covering a lon/lat region, clamped to the grid
    pub fn pixel_window(
        &self,
        region: &Region<f64>,
        dimensions: (u32, u32),
    ) -> Result<Region<u32>, ProjectionError> {
        let (west, south, east, north) = region.as_tuple();
        let mut us = Vec::with_capacity(8);
        let mut vs = Vec::with_capacity(8);
        for (lat, lon) in [
            (north, west),
            (north, (west + east) / 2.0),
            (north, east),
            ((north + south) / 2.0, east),
            (south, east),
            (south, (west + east) / 2.0),
            (south, west),
            ((north + south) / 2.0, west),
        ] {
            let (u, v) = self.transform_from_lat_lon_deg(lat, lon)?;
            us.push(u);
            vs.push(v);
        }
        let clamp = |value: f64, max: u32| value.max(0.0).min(max as f64);
        let (Some(u), Some(v)) = (Interval::enclosing(us), Interval::enclosing(vs)) else {
            return Err(ProjectionError::NotFinite((west, north)));
        };
        // Snap to the nearest pixel edge when within rounding noise
        let min_x = clamp((u.min + EDGE_EPSILON).floor(), dimensions.0) as u32;
        let max_x = clamp((u.max - EDGE_EPSILON).ceil(), dimensions.0) as u32;
        let min_y = clamp((v.min + EDGE_EPSILON).floor(), dimensions.1) as u32;
        let max_y = clamp((v.max - EDGE_EPSILON).ceil(), dimensions.1) as u32;
        Ok(Region::new(min_x, min_y, max_x.max(min_x), max_y.max(min_y)))
    }
}
