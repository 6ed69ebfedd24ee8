// Band calibration
//   Raw digital counts become physical units through `value * scale + offset`.
//   The service publishes the pair as flat metadata (`<band>_scale`, `<band>_offset`),
//   which is validated once here and carried as a typed table afterwards.

use super::{RasterError, RasterImage};
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::*;

pub const SCALE_SUFFIX: &str = "_scale";
pub const OFFSET_SUFFIX: &str = "_offset";
pub const DEFAULT_RAW_BAND_PATTERN: &str = "CMI_C..";

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    MissingCalibrationMetadata(String),
    IncompleteMetadata(String),
    NonFinite((String, f64)),
    Raster(RasterError),
}

impl From<RasterError> for CalibrationError {
    fn from(e: RasterError) -> Self {
        CalibrationError::Raster(e)
    }
}

impl Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for CalibrationError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub scale: f64,
    pub offset: f64,
}

impl Calibration {
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0)
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationTable {
    entries: BTreeMap<String, Calibration>,
}

impl CalibrationTable {
    /// Builds the table from flat image metadata. Keys other than
    /// `<band>_scale` and `<band>_offset` are ignored.
    pub fn from_metadata(properties: &BTreeMap<String, f64>) -> Result<Self, CalibrationError> {
        let mut entries = BTreeMap::new();
        for (key, scale) in properties {
            let Some(band) = key.strip_suffix(SCALE_SUFFIX).filter(|b| !b.is_empty()) else {
                continue;
            };
            let offset = properties
                .get(&format!("{band}{OFFSET_SUFFIX}"))
                .ok_or_else(|| CalibrationError::IncompleteMetadata(band.to_string()))?;
            for value in [*scale, *offset] {
                if !value.is_finite() {
                    return Err(CalibrationError::NonFinite((band.to_string(), value)));
                }
            }
            entries.insert(band.to_string(), Calibration::new(*scale, *offset));
        }
        for key in properties.keys() {
            if let Some(band) = key.strip_suffix(OFFSET_SUFFIX).filter(|b| !b.is_empty()) {
                if !entries.contains_key(band) {
                    return Err(CalibrationError::IncompleteMetadata(band.to_string()));
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn with_entry(mut self, band: impl Into<String>, calibration: Calibration) -> Self {
        self.entries.insert(band.into(), calibration);
        self
    }

    pub fn get(&self, band: &str) -> Option<&Calibration> {
        self.entries.get(band)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Band name pattern where `.` matches any single character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPattern(String);

impl BandPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn matches(&self, name: &str) -> bool {
        name.chars().count() == self.0.chars().count()
            && self
                .0
                .chars()
                .zip(name.chars())
                .all(|(p, c)| p == '.' || p == c)
    }
}

impl Default for BandPattern {
    fn default() -> Self {
        Self::new(DEFAULT_RAW_BAND_PATTERN)
    }
}

impl Display for BandPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rescales every raw `CMI_C..` band in place of itself
pub fn rescale(image: RasterImage) -> Result<RasterImage, CalibrationError> {
    rescale_matching(image, &BandPattern::default())
}

/// Applying this twice applies the calibration twice
pub fn rescale_matching(
    mut image: RasterImage,
    pattern: &BandPattern,
) -> Result<RasterImage, CalibrationError> {
    let names: Vec<String> = image
        .band_names()
        .filter(|name| pattern.matches(name))
        .map(String::from)
        .collect();
    for name in names {
        let calibration = *image
            .calibration
            .get(&name)
            .ok_or_else(|| CalibrationError::MissingCalibrationMetadata(name.clone()))?;
        let scaled = image.require_band(&name)?.map(|v| calibration.apply(v));
        trace!("{}: {name} x {} + {}", image.id, calibration.scale, calibration.offset);
        image.overwrite_band(&name, scaled)?;
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::tests::test_image;
    use crate::raster::Band;

    fn metadata(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn pattern_matching() {
        let pattern = BandPattern::default();
        assert!(pattern.matches("CMI_C01"));
        assert!(pattern.matches("CMI_C16"));
        assert!(!pattern.matches("CMI_C1"));
        assert!(!pattern.matches("DQF_C01"));
        assert!(!pattern.matches("CMI_C01_median"));
        assert!(!pattern.matches("NDVI"));
    }

    #[test]
    fn table_from_metadata() {
        let table = CalibrationTable::from_metadata(&metadata(&[
            ("CMI_C02_scale", 0.0002),
            ("CMI_C02_offset", -0.01),
            ("CMI_C03_scale", 0.0001),
            ("CMI_C03_offset", 0.0),
            ("satellite_longitude", -75.2),
        ]))
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("CMI_C02"), Some(&Calibration::new(0.0002, -0.01)));
        assert!(table.get("satellite_longitude").is_none());
    }

    #[test]
    fn rejects_half_specified_metadata() {
        assert_eq!(
            CalibrationTable::from_metadata(&metadata(&[("CMI_C02_scale", 0.0002)])),
            Err(CalibrationError::IncompleteMetadata("CMI_C02".into()))
        );
        assert_eq!(
            CalibrationTable::from_metadata(&metadata(&[("CMI_C02_offset", 0.0)])),
            Err(CalibrationError::IncompleteMetadata("CMI_C02".into()))
        );
        assert!(matches!(
            CalibrationTable::from_metadata(&metadata(&[
                ("CMI_C02_scale", f64::NAN),
                ("CMI_C02_offset", 0.0)
            ])),
            Err(CalibrationError::NonFinite(_))
        ));
    }

    #[test]
    fn rescale_matching_bands_only() {
        let table = CalibrationTable::default()
            .with_entry("CMI_C02", Calibration::new(0.5, 1.0));
        let image = test_image((2, 1))
            .with_calibration(table)
            .with_band("CMI_C02", Band::new((2, 1), vec![Some(4.0), None]).unwrap())
            .unwrap()
            .with_band("DQF", Band::filled((2, 1), 4.0))
            .unwrap();
        let scaled = rescale(image).unwrap();
        assert_eq!(scaled.band("CMI_C02").unwrap().data(), &[Some(3.0), None]);
        assert_eq!(scaled.band("DQF").unwrap().data(), &[Some(4.0), Some(4.0)]);
        assert_eq!(
            scaled.band_names().collect::<Vec<_>>(),
            vec!["CMI_C02", "DQF"]
        );
    }

    #[test]
    fn rescale_is_not_idempotent() {
        let table = CalibrationTable::default()
            .with_entry("CMI_C01", Calibration::new(2.0, 0.0));
        let image = test_image((1, 1))
            .with_calibration(table)
            .with_band("CMI_C01", Band::filled((1, 1), 3.0))
            .unwrap();
        let twice = rescale(rescale(image).unwrap()).unwrap();
        assert_eq!(twice.band("CMI_C01").unwrap().get_pixel(0, 0), Some(12.0));
    }

    #[test]
    fn identity_rescale_is_idempotent() {
        let table = CalibrationTable::default().with_entry("CMI_C01", Calibration::identity());
        let image = test_image((2, 1))
            .with_calibration(table)
            .with_band("CMI_C01", Band::from_values((2, 1), vec![0.25, -3.5]).unwrap())
            .unwrap();
        let twice = rescale(rescale(image).unwrap()).unwrap();
        let band = twice.band("CMI_C01").unwrap();
        assert_eq!(band.data(), &[Some(0.25), Some(-3.5)]);
    }

    #[test]
    fn missing_calibration() {
        let image = test_image((1, 1))
            .with_band("CMI_C03", Band::filled((1, 1), 3.0))
            .unwrap();
        assert_eq!(
            rescale(image).unwrap_err(),
            CalibrationError::MissingCalibrationMetadata("CMI_C03".into())
        );
    }
}
