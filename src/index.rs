// Spectral indices
//   Both indices append one band and leave the inputs untouched.
//   Masked inputs and an exactly zero denominator give a masked pixel.

use crate::raster::{AbiChannel, Band, RasterError, RasterImage};
use rayon::prelude::*;
use std::fmt::Display;

pub const NDVI_BAND: &str = "NDVI";
pub const NDWI_BAND: &str = "NDWI";

/// Weights of the synthetic green band (red, nir, blue)
pub const GREEN_WEIGHTS: (f64, f64, f64) = (0.45, 0.10, 0.45);

#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    MissingBand(String),
    DimensionMismatch(((u32, u32), (u32, u32))),
    Raster(RasterError),
}

impl From<RasterError> for IndexError {
    fn from(e: RasterError) -> Self {
        IndexError::Raster(e)
    }
}

impl Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for IndexError {}

pub type IndexResult<T> = Result<T, IndexError>;

/// Which bands hold the near infrared, red and blue reflectances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSelection {
    pub nir: String,
    pub red: String,
    pub blue: String,
}

impl BandSelection {
    pub fn new(nir: impl Into<String>, red: impl Into<String>, blue: impl Into<String>) -> Self {
        Self {
            nir: nir.into(),
            red: red.into(),
            blue: blue.into(),
        }
    }

    pub fn from_channels(nir: AbiChannel, red: AbiChannel, blue: AbiChannel) -> Self {
        Self::new(nir.cmi_band(), red.cmi_band(), blue.cmi_band())
    }

    pub fn names(&self) -> [&str; 3] {
        [self.nir.as_str(), self.red.as_str(), self.blue.as_str()]
    }
}

impl Default for BandSelection {
    fn default() -> Self {
        Self::from_channels(AbiChannel::Veggie, AbiChannel::Red, AbiChannel::Blue)
    }
}

fn input<'a>(image: &'a RasterImage, name: &str) -> IndexResult<&'a Band> {
    image
        .band(name)
        .ok_or_else(|| IndexError::MissingBand(name.to_string()))
}

fn check_dimensions(a: &Band, b: &Band) -> IndexResult<()> {
    if a.dimensions != b.dimensions {
        return Err(IndexError::DimensionMismatch((a.dimensions, b.dimensions)));
    }
    Ok(())
}

fn ratio(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    let (a, b) = (a?, b?);
    let sum = a + b;
    if sum == 0.0 {
        None
    } else {
        Some((a - b) / sum)
    }
}

/// `(a - b) / (a + b)` per pixel, row-parallel
pub fn normalized_difference(a: &Band, b: &Band) -> IndexResult<Band> {
    check_dimensions(a, b)?;
    let width = a.width().max(1) as usize;
    let data: Vec<Option<f64>> = a
        .data()
        .par_chunks(width)
        .zip(b.data().par_chunks(width))
        .flat_map_iter(|(row_a, row_b)| {
            row_a
                .iter()
                .zip(row_b)
                .map(|(a, b)| ratio(*a, *b))
                .collect::<Vec<_>>()
        })
        .collect();
    Ok(Band::new(a.dimensions, data)?)
}

/// Green reflectance synthesized from red, near infrared and blue
pub fn synthetic_green(red: &Band, nir: &Band, blue: &Band) -> IndexResult<Band> {
    check_dimensions(red, nir)?;
    check_dimensions(red, blue)?;
    let (wr, wn, wb) = GREEN_WEIGHTS;
    let data: Vec<Option<f64>> = red
        .data()
        .par_iter()
        .zip(nir.data().par_iter())
        .zip(blue.data().par_iter())
        .map(|((r, n), b)| Some(wr * (*r)? + wn * (*n)? + wb * (*b)?))
        .collect();
    Ok(Band::new(red.dimensions, data)?)
}

pub fn compute_ndvi(mut image: RasterImage, bands: &BandSelection) -> IndexResult<RasterImage> {
    let ndvi = normalized_difference(input(&image, &bands.nir)?, input(&image, &bands.red)?)?;
    image.add_band(NDVI_BAND, ndvi)?;
    Ok(image)
}

pub fn compute_ndwi(mut image: RasterImage, bands: &BandSelection) -> IndexResult<RasterImage> {
    let nir = input(&image, &bands.nir)?;
    let green = synthetic_green(input(&image, &bands.red)?, nir, input(&image, &bands.blue)?)?;
    let ndwi = normalized_difference(&green, nir)?;
    image.add_band(NDWI_BAND, ndwi)?;
    Ok(image)
}
