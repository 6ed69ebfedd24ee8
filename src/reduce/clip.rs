use super::ReduceResult;
use crate::geo::RegionOfInterest;
use crate::raster::RasterImage;

/// Masks every pixel whose center lies outside the region, in every band.
/// Extent and band set are unchanged.
pub fn clip(image: &RasterImage, region: &RegionOfInterest) -> ReduceResult<RasterImage> {
    let keep = image.pixel_center_mask(|lat, lon| region.contains_lat_lon(lat, lon))?;
    Ok(image.map_bands(|_, band| band.apply_mask(&keep))?)
}
