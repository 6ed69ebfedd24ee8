use super::{Band, RasterError, RasterImage, RasterResult};
use crate::geo::{ProjectionError, Region};

impl Band {
    pub fn get_region(&self, region: Region<u32>) -> RasterResult<Band> {
        if region.x.max > self.dimensions.0
            || region.y.max > self.dimensions.1
            || region.x.min > region.x.max
            || region.y.min > region.y.max
        {
            return Err(RasterError::PixelOutOfRange((region.x.max, region.y.max)));
        }
        let width = region.x.range();
        let height = region.y.range();
        let mut data = Vec::with_capacity((width * height) as usize);
        for row in self.rows().skip(region.y.min as usize).take(height as usize) {
            data.extend_from_slice(&row[region.x.min as usize..region.x.max as usize]);
        }
        Band::new((width, height), data)
    }
}

impl RasterImage {
    /// Sub-image over a pixel window, with the grid origin moved to match
    pub fn crop(&self, region: Region<u32>) -> RasterResult<Self> {
        let mut out = Self::new(
            self.id.clone(),
            self.time,
            self.projection.shifted(region.x.min, region.y.min),
            (region.x.range(), region.y.range()),
        )
        .with_calibration(self.calibration.clone());
        for (name, band) in self.bands() {
            out.add_band(name, band.get_region(region)?)?;
        }
        Ok(out)
    }

    /// Per-pixel flag from a predicate on pixel center (lat, lon) degrees
    pub fn pixel_center_mask<F>(&self, keep: F) -> Result<Vec<bool>, ProjectionError>
    where
        F: Fn(f64, f64) -> bool,
    {
        let (width, height) = self.dimensions;
        let mut mask = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                let (lat, lon) = self.projection.pixel_center_lat_lon_deg(col, row)?;
                mask.push(keep(lat, lon));
            }
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::tests::test_image;

    fn ramp_band() -> Band {
        Band::from_values((4, 3), (0..12).map(|v| v as f64).collect()).unwrap()
    }

    #[test]
    fn band_region() {
        let cropped = ramp_band().get_region(Region::new(1, 1, 3, 3)).unwrap();
        assert_eq!(cropped.dimensions, (2, 2));
        assert_eq!(cropped.data(), &[Some(5.0), Some(6.0), Some(9.0), Some(10.0)]);
        assert!(ramp_band().get_region(Region::new(0, 0, 5, 1)).is_err());
    }

    #[test]
    fn image_crop_moves_origin() {
        let image = test_image((4, 3)).with_band("v", ramp_band()).unwrap();
        let cropped = image.crop(Region::new(2, 1, 4, 3)).unwrap();
        assert_eq!(cropped.dimensions, (2, 2));
        assert_eq!(cropped.band("v").unwrap().get_pixel(0, 0), Some(6.0));
        assert!((cropped.projection.origin.0 + 103.98).abs() < 1e-9);
        assert!((cropped.projection.origin.1 - 37.99).abs() < 1e-9);
    }

    #[test]
    fn center_mask() {
        let image = test_image((4, 1));
        let mask = image.pixel_center_mask(|_, lon| lon < -103.98).unwrap();
        assert_eq!(mask, vec![true, true, false, false]);
    }
}
