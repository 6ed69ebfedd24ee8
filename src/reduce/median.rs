use super::{ReduceError, ReduceResult};
use crate::raster::{Band, RasterImage};
use rayon::prelude::*;
use tracing::*;

/// Median of the values, averaging the two middle values for even counts
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn median_band(bands: &[&Band], dimensions: (u32, u32)) -> ReduceResult<Band> {
    let (width, height) = (dimensions.0 as usize, dimensions.1 as usize);
    let data: Vec<Option<f64>> = (0..height)
        .into_par_iter()
        .flat_map_iter(|row| {
            let mut values = Vec::with_capacity(bands.len());
            (0..width)
                .map(|col| {
                    let i = row * width + col;
                    values.clear();
                    values.extend(bands.iter().filter_map(|b| b.data()[i]));
                    median(&mut values)
                })
                .collect::<Vec<_>>()
        })
        .collect();
    Ok(Band::new(dimensions, data)?)
}

/// Per-pixel, per-band median over a sequence of images on one grid.
///   Only bands present in every image are reduced, in the first image's order.
pub fn aggregate(images: &[RasterImage]) -> ReduceResult<RasterImage> {
    let first = images.first().ok_or(ReduceError::EmptyCollection)?;
    for image in &images[1..] {
        if image.dimensions != first.dimensions || !image.projection.same_grid(&first.projection) {
            return Err(ReduceError::GridMismatch(image.id.clone()));
        }
    }

    let mut out = RasterImage::new(
        format!("median({} images)", images.len()),
        first.time,
        first.projection.clone(),
        first.dimensions,
    )
    .with_calibration(first.calibration.clone());

    for name in first.band_names() {
        let bands: Option<Vec<&Band>> = images.iter().map(|image| image.band(name)).collect();
        let Some(bands) = bands else {
            debug!("{name} is not in every image, not reduced");
            continue;
        };
        out.add_band(name, median_band(&bands, first.dimensions)?)?;
    }
    Ok(out)
}
