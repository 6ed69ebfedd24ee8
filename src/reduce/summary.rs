use super::{ReduceError, ReduceResult};
use crate::geo::RegionOfInterest;
use crate::raster::RasterImage;
use tracing::*;

/// Upper bound on lattice points per summary
pub const MAX_SAMPLES: usize = 4_000_000;

/// (lat, lon) of a square lattice with `scale_m` spacing, centered on the
/// region center and restricted to the region
pub fn sample_lattice(region: &RegionOfInterest, scale_m: f64) -> ReduceResult<Vec<(f64, f64)>> {
    if !scale_m.is_finite() || scale_m <= 0.0 {
        return Err(ReduceError::InvalidScale(scale_m));
    }
    let steps = (region.radius_m() / scale_m).floor() as i64;
    let side = 2 * steps as usize + 1;
    if side.saturating_mul(side) > MAX_SAMPLES {
        return Err(ReduceError::TooManySamples(side.saturating_mul(side)));
    }
    let center = region.center();
    let mut points = Vec::with_capacity(side * side);
    for j in -steps..=steps {
        for i in -steps..=steps {
            let (lat, lon) = center.offset_m(i as f64 * scale_m, j as f64 * scale_m);
            if region.contains_lat_lon(lat, lon) {
                points.push((lat, lon));
            }
        }
    }
    Ok(points)
}

/// Mean of `band` at lattice points inside the region, nearest pixel lookup.
/// `None` when no lattice point lands on a valid pixel.
pub fn summarize(
    image: &RasterImage,
    band: &str,
    region: &RegionOfInterest,
    scale_m: f64,
) -> ReduceResult<Option<f64>> {
    let values = image.require_band(band)?;
    let (width, height) = image.dimensions;
    let points = sample_lattice(region, scale_m)?;

    let mut sum = 0.0;
    let mut count = 0_usize;
    for (lat, lon) in &points {
        let (u, v) = match image.projection.transform_from_lat_lon_deg(*lat, *lon) {
            Ok(uv) => uv,
            Err(e) => {
                trace!("sample ({lat}, {lon}) not on grid: {e}");
                continue;
            }
        };
        if u < 0.0 || v < 0.0 || u >= width as f64 || v >= height as f64 {
            continue;
        }
        if let Some(value) = values.get_pixel(u.floor() as u32, v.floor() as u32) {
            sum += value;
            count += 1;
        }
    }
    debug!(
        "{band} summary over {region}: {count} valid of {} samples at {scale_m}m",
        points.len()
    );
    Ok((count > 0).then(|| sum / count as f64))
}
