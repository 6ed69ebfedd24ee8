// NDVI pipeline
//   daylight window -> query -> rescale -> indices -> median -> clip -> summary -> map
//   The map document is written last, after the summary succeeded.

use crate::error::{CloudNdviError, CloudNdviResult};
use crate::geo::{GeoPoint, RegionOfInterest};
use crate::index::{compute_ndvi, compute_ndwi, BandSelection, NDVI_BAND, NDWI_BAND};
use crate::raster::calibration::rescale_matching;
use crate::raster::{AbiChannel, BandPattern, RasterImage};
use crate::reduce::{aggregate, clip, summarize};
use crate::render::{ColorRamp, MapDocument, MapHandle, MapLayer};
use crate::render::{DEFAULT_HEIGHT, DEFAULT_TITLE, DEFAULT_WIDTH, DEFAULT_ZOOM};
use crate::service::{fetch_images, CollectionQuery, ImageryService, RetryPolicy};
use crate::solar::{compute_window, yesterday, DaylightWindow};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Instant;
use tracing::*;

pub const DEFAULT_COLLECTION: &str = "NOAA/GOES/16/MCMIPC";
pub const DEFAULT_CHANNELS: [AbiChannel; 3] =
    [AbiChannel::Blue, AbiChannel::Red, AbiChannel::Veggie];
pub const DEFAULT_RADIUS_M: f64 = 40_000.0;
pub const DEFAULT_OUTPUT: &str = "ROI_NDVI.html";
pub const DEFAULT_SUMMARY_SCALE_M: f64 = 2_000.0;
pub const REDUCER_SUFFIX: &str = "_median";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineParams {
    pub point: GeoPoint,
    pub collection: String,
    pub bands: Vec<String>,
    pub band_selection: BandSelection,
    pub raw_bands: BandPattern,
    pub radius_m: f64,
    pub reference_date: NaiveDate,
    pub output: PathBuf,
    pub title: String,
    pub width: String,
    pub height: String,
    pub zoom: u8,
    pub summary_scale_m: f64,
    pub ndwi: bool,
    pub retry: RetryPolicy,
}

impl PipelineParams {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            collection: DEFAULT_COLLECTION.to_string(),
            bands: DEFAULT_CHANNELS.iter().map(AbiChannel::cmi_band).collect(),
            band_selection: BandSelection::default(),
            raw_bands: BandPattern::default(),
            radius_m: DEFAULT_RADIUS_M,
            reference_date: yesterday(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            title: DEFAULT_TITLE.to_string(),
            width: DEFAULT_WIDTH.to_string(),
            height: DEFAULT_HEIGHT.to_string(),
            zoom: DEFAULT_ZOOM,
            summary_scale_m: DEFAULT_SUMMARY_SCALE_M,
            ndwi: false,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_bands<S: Into<String>>(mut self, bands: impl IntoIterator<Item = S>) -> Self {
        self.bands = bands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_band_selection(mut self, selection: BandSelection) -> Self {
        self.band_selection = selection;
        self
    }

    pub fn with_raw_bands(mut self, pattern: BandPattern) -> Self {
        self.raw_bands = pattern;
        self
    }

    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.width = width.into();
        self.height = height.into();
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_summary_scale(mut self, scale_m: f64) -> Self {
        self.summary_scale_m = scale_m;
        self
    }

    pub fn with_ndwi(mut self, ndwi: bool) -> Self {
        self.ndwi = ndwi;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub mean_ndvi: Option<f64>,
    pub map: MapHandle,
    pub window: DaylightWindow,
    pub image_count: usize,
}

fn index_image(image: RasterImage, params: &PipelineParams) -> CloudNdviResult<RasterImage> {
    let image = rescale_matching(image, &params.raw_bands)?;
    let image = compute_ndvi(image, &params.band_selection)?;
    if params.ndwi {
        Ok(compute_ndwi(image, &params.band_selection)?)
    } else {
        Ok(image)
    }
}

pub async fn run_pipeline<S: ImageryService + ?Sized>(
    service: &S,
    params: &PipelineParams,
) -> CloudNdviResult<PipelineOutput> {
    let t_start = Instant::now();
    let region = RegionOfInterest::new(params.point, params.radius_m)?;
    if !params.summary_scale_m.is_finite() || params.summary_scale_m <= 0.0 {
        return Err(CloudNdviError::InvalidRegion(format!(
            "summary scale {} m",
            params.summary_scale_m
        )));
    }

    // Daylight window
    let window = compute_window(&params.point, params.reference_date)?;
    info!("Daylight window at {}: {window}", params.point);

    // Retrieval
    let t_fetch = Instant::now();
    let query = CollectionQuery {
        collection: params.collection.clone(),
        window,
        region,
        bands: params.bands.clone(),
    };
    let images = fetch_images(service, &query, &params.retry).await?;
    if images.is_empty() {
        return Err(CloudNdviError::EmptyCollection);
    }
    let image_count = images.len();
    info!(
        "Fetched {image_count} images from {} in {:.3}s",
        params.collection,
        t_fetch.elapsed().as_secs_f64()
    );

    // Per-image band math
    let t_index = Instant::now();
    let indexed = images
        .into_iter()
        .map(|image| {
            debug!("{image}");
            index_image(image, params)
        })
        .collect::<CloudNdviResult<Vec<_>>>()?;

    // Reduce
    let median = aggregate(&indexed)?;
    let clipped = clip(&median, &region)?;
    let mean_ndvi = summarize(&median, NDVI_BAND, &region, params.summary_scale_m)?;
    info!(
        "Indexed and reduced {image_count} images in {:.3}s, mean NDVI {mean_ndvi:?}",
        t_index.elapsed().as_secs_f64()
    );

    // Map
    let ndvi_layer = MapLayer::from_band(&clipped, NDVI_BAND, ColorRamp::ndvi()?, &region)?
        .with_label(format!("{NDVI_BAND}{REDUCER_SUFFIX}"));
    let mut document = MapDocument::new(params.title.as_str())
        .with_size(params.width.as_str(), params.height.as_str())
        .centered(params.point, params.zoom)
        .with_layer(ndvi_layer);
    if params.ndwi {
        let ndwi_layer = MapLayer::from_band(&clipped, NDWI_BAND, ColorRamp::ndwi()?, &region)?
            .with_label(format!("{NDWI_BAND}{REDUCER_SUFFIX}"));
        document = document.with_layer(ndwi_layer);
    }
    let map = document.write(&params.output).await?;

    info!("Pipeline done in {:.3}s", t_start.elapsed().as_secs_f64());
    Ok(PipelineOutput {
        mean_ndvi,
        map,
        window,
        image_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = PipelineParams::new(GeoPoint::new(37.25, -102.84).unwrap());
        assert_eq!(params.collection, "NOAA/GOES/16/MCMIPC");
        assert_eq!(params.bands, vec!["CMI_C01", "CMI_C02", "CMI_C03"]);
        assert_eq!(params.radius_m, 40_000.0);
        assert_eq!(params.reference_date, yesterday());
        assert_eq!(params.output, PathBuf::from("ROI_NDVI.html"));
        assert_eq!(params.title, "My Map");
        assert_eq!((params.width.as_str(), params.height.as_str()), ("100%", "880px"));
        assert_eq!(params.zoom, 10);
        assert_eq!(params.summary_scale_m, 2000.0);
        assert!(!params.ndwi);
        assert_eq!(params.retry, RetryPolicy::default());
    }

    #[test]
    fn builder() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
        let params = PipelineParams::new(GeoPoint::new(0.0, 0.0).unwrap())
            .with_bands(["CMI_C02", "CMI_C03"])
            .with_date(date)
            .with_radius(1000.0)
            .with_ndwi(true)
            .with_output("out.html");
        assert_eq!(params.bands, vec!["CMI_C02", "CMI_C03"]);
        assert_eq!(params.reference_date, date);
        assert_eq!(params.radius_m, 1000.0);
        assert!(params.ndwi);
        assert_eq!(params.output, PathBuf::from("out.html"));
    }
}
