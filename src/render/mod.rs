use crate::geo::{GeoPoint, ProjectionError, Region, RegionOfInterest};
use crate::raster::{encode_png, Band, RasterError, RasterImage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::*;

mod html;
mod ramp;

pub use html::{escape_html, render_html};
pub use ramp::{ColorRamp, Rgb, NDVI_PALETTE, NDWI_PALETTE};

pub const DEFAULT_TITLE: &str = "My Map";
pub const DEFAULT_WIDTH: &str = "100%";
pub const DEFAULT_HEIGHT: &str = "880px";
pub const DEFAULT_ZOOM: u8 = 10;

#[derive(Debug)]
pub enum RenderError {
    InvalidColor(String),
    InvalidRange((f64, f64)),
    EmptyRamp,
    Image(image::ImageError),
    Raster(RasterError),
    Projection(ProjectionError),
    Io(std::io::Error),
}

impl From<image::ImageError> for RenderError {
    fn from(e: image::ImageError) -> Self {
        RenderError::Image(e)
    }
}

impl From<RasterError> for RenderError {
    fn from(e: RasterError) -> Self {
        RenderError::Raster(e)
    }
}

impl From<ProjectionError> for RenderError {
    fn from(e: ProjectionError) -> Self {
        RenderError::Projection(e)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for RenderError {}

/// One band colorized by a ramp and encoded as PNG, placed at lon/lat bounds
#[derive(Clone, Debug)]
pub struct MapLayer {
    name: String,
    label: String,
    ramp: ColorRamp,
    bounds: Region<f64>,
    png: Vec<u8>,
}

impl MapLayer {
    /// Layer from `band` cropped to the pixel window around `region`
    pub fn from_band(
        image: &RasterImage,
        band: &str,
        ramp: ColorRamp,
        region: &RegionOfInterest,
    ) -> Result<Self, RenderError> {
        image.require_band(band)?;
        let roi_bounds = region.bounds_lat_lon_deg();
        let window = image
            .projection
            .pixel_window(&roi_bounds, image.dimensions)?;

        let (cropped, bounds) = if window.is_empty() {
            warn!("{band} does not overlap {region}, rendering an empty layer");
            (Band::masked((1, 1)), roi_bounds)
        } else {
            let cropped = image.select(&[band])?.crop(window)?;
            let bounds = cropped.bounds_lat_lon_deg()?;
            (cropped.require_band(band)?.clone(), bounds)
        };

        let png = encode_png(cropped.to_rgba(|v| ramp.color_at(v).to_rgba()))?;
        debug!(
            "{band} layer {}x{} px, {} bytes PNG, bounds {bounds}",
            cropped.width(),
            cropped.height(),
            png.len()
        );
        Ok(Self {
            name: band.to_string(),
            label: band.to_string(),
            ramp,
            bounds,
            png,
        })
    }

    /// Legend caption
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn ramp(&self) -> &ColorRamp {
        &self.ramp
    }

    pub fn bounds(&self) -> &Region<f64> {
        &self.bounds
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// A written map document
#[derive(Clone, Debug, PartialEq)]
pub struct MapHandle {
    pub path: PathBuf,
    pub title: String,
    pub center: (f64, f64),
    pub zoom: u8,
    pub layers: Vec<String>,
    pub bytes: usize,
}

#[derive(Clone, Debug)]
pub struct MapDocument {
    title: String,
    width: String,
    height: String,
    view: Option<(GeoPoint, u8)>,
    layers: Vec<MapLayer>,
}

impl MapDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: DEFAULT_WIDTH.to_string(),
            height: DEFAULT_HEIGHT.to_string(),
            view: None,
            layers: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.width = width.into();
        self.height = height.into();
        self
    }

    pub fn centered(mut self, center: GeoPoint, zoom: u8) -> Self {
        self.view = Some((center, zoom));
        self
    }

    pub fn with_layer(mut self, layer: MapLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> &str {
        &self.width
    }

    pub fn height(&self) -> &str {
        &self.height
    }

    pub fn layers(&self) -> &[MapLayer] {
        &self.layers
    }

    /// ((lat, lon), zoom), falling back to the first layer center or the whole world
    pub fn view(&self) -> ((f64, f64), u8) {
        match (&self.view, self.layers.first()) {
            (Some((center, zoom)), _) => ((center.lat_deg(), center.lon_deg()), *zoom),
            (None, Some(layer)) => {
                let b = layer.bounds();
                (
                    ((b.y_min() + b.y_max()) / 2.0, (b.x_min() + b.x_max()) / 2.0),
                    DEFAULT_ZOOM,
                )
            }
            (None, None) => ((0.0, 0.0), 2),
        }
    }

    pub fn to_html(&self) -> String {
        render_html(self)
    }

    pub async fn write<P: AsRef<Path>>(&self, path: P) -> Result<MapHandle, RenderError> {
        let path = path.as_ref();
        let html = self.to_html();
        tokio::fs::write(path, html.as_bytes()).await?;
        let (center, zoom) = self.view();
        info!("Wrote {} ({} bytes)", path.display(), html.len());
        Ok(MapHandle {
            path: path.to_path_buf(),
            title: self.title.clone(),
            center,
            zoom,
            layers: self.layers.iter().map(|l| l.name.clone()).collect(),
            bytes: html.len(),
        })
    }
}
