use crate::geo::{GridProjection, ProjectionError, Region};
use chrono::{DateTime, Utc};
use std::fmt::Display;

mod band;
pub mod calibration;
mod channel;
mod image;
mod ops;

pub use band::Band;
pub use calibration::{BandPattern, Calibration, CalibrationError, CalibrationTable};
pub use channel::AbiChannel;
pub use self::image::encode_png;

#[derive(Debug, Clone, PartialEq)]
pub enum RasterError {
    BufferSize((usize, (u32, u32))),
    DimensionMismatch((String, (u32, u32), (u32, u32))),
    DuplicateBand(String),
    MissingBand(String),
    PixelOutOfRange((u32, u32)),
}

impl Display for RasterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for RasterError {}

pub type RasterResult<T> = Result<T, RasterError>;

/// A georeferenced multi-band image. Bands share the image dimensions and keep
/// insertion order.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pub id: String,
    pub time: DateTime<Utc>,
    pub projection: GridProjection,
    pub dimensions: (u32, u32),
    pub calibration: CalibrationTable,
    bands: Vec<(String, Band)>,
}

impl RasterImage {
    pub fn new(
        id: impl Into<String>,
        time: DateTime<Utc>,
        projection: GridProjection,
        dimensions: (u32, u32),
    ) -> Self {
        Self {
            id: id.into(),
            time,
            projection,
            dimensions,
            calibration: CalibrationTable::default(),
            bands: Vec::new(),
        }
    }

    pub fn with_calibration(mut self, calibration: CalibrationTable) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_band(mut self, name: impl Into<String>, band: Band) -> RasterResult<Self> {
        self.add_band(name, band)?;
        Ok(self)
    }

    pub fn add_band(&mut self, name: impl Into<String>, band: Band) -> RasterResult<()> {
        let name = name.into();
        if self.has_band(&name) {
            return Err(RasterError::DuplicateBand(name));
        }
        self.check_dimensions(&name, &band)?;
        self.bands.push((name, band));
        Ok(())
    }

    /// Replaces an existing band in place, keeping its position
    pub fn overwrite_band(&mut self, name: &str, band: Band) -> RasterResult<()> {
        self.check_dimensions(name, &band)?;
        let slot = self
            .bands
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| RasterError::MissingBand(name.to_string()))?;
        slot.1 = band;
        Ok(())
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|(n, _)| n == name)
    }

    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn require_band(&self, name: &str) -> RasterResult<&Band> {
        self.band(name)
            .ok_or_else(|| RasterError::MissingBand(name.to_string()))
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|(n, _)| n.as_str())
    }

    pub fn bands(&self) -> impl Iterator<Item = (&str, &Band)> {
        self.bands.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Copy holding only `names`, in the requested order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> RasterResult<Self> {
        let mut bands = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            bands.push((name.to_string(), self.require_band(name)?.clone()));
        }
        Ok(Self {
            bands,
            ..self.without_bands()
        })
    }

    /// Copy with every band passed through `f`
    pub fn map_bands<F>(&self, f: F) -> RasterResult<Self>
    where
        F: Fn(&str, &Band) -> RasterResult<Band>,
    {
        let mut out = self.without_bands();
        for (name, band) in self.bands() {
            out.add_band(name, f(name, band)?)?;
        }
        Ok(out)
    }

    pub fn bounds_lat_lon_deg(&self) -> Result<Region<f64>, ProjectionError> {
        self.projection.bounds_lat_lon_deg(self.dimensions)
    }

    fn without_bands(&self) -> Self {
        Self {
            id: self.id.clone(),
            time: self.time,
            projection: self.projection.clone(),
            dimensions: self.dimensions,
            calibration: self.calibration.clone(),
            bands: Vec::new(),
        }
    }

    fn check_dimensions(&self, name: &str, band: &Band) -> RasterResult<()> {
        if band.dimensions != self.dimensions {
            return Err(RasterError::DimensionMismatch((
                name.to_string(),
                self.dimensions,
                band.dimensions,
            )));
        }
        Ok(())
    }
}

impl Display for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RasterImage({}, {}, {}x{}, EPSG:{}, bands: [{}])",
            self.id,
            self.time.format("%Y-%m-%dT%H:%M:%SZ"),
            self.dimensions.0,
            self.dimensions.1,
            self.projection.epsg,
            self.bands
                .iter()
                .map(|(n, _)| n.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
