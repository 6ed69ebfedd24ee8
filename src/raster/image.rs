use super::Band;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

impl Band {
    /// Colorized copy, masked pixels fully transparent
    pub fn to_rgba<F>(&self, color: F) -> RgbaImage
    where
        F: Fn(f64) -> Rgba<u8>,
    {
        let (width, height) = self.dimensions;
        RgbaImage::from_fn(width, height, |x, y| match self.get_pixel(x, y) {
            Some(v) => color(v),
            None => TRANSPARENT,
        })
    }
}

pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
