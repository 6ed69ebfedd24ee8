// cloudndvi
//   Daytime NDVI/NDWI maps of a circular region from cloud-hosted satellite imagery.

pub mod error;
pub mod geo;
pub mod index;
pub mod pipeline;
pub mod raster;
pub mod reduce;
pub mod render;
pub mod service;
pub mod solar;

pub use error::{CloudNdviError, CloudNdviResult};
pub use geo::{GeoPoint, GridProjection, Interval, Point2D, Region, RegionOfInterest};
pub use index::{compute_ndvi, compute_ndwi, BandSelection};
pub use pipeline::{run_pipeline, PipelineOutput, PipelineParams};
pub use raster::calibration::rescale;
pub use raster::{Band, RasterImage};
pub use reduce::{aggregate, clip, summarize};
pub use render::{ColorRamp, MapDocument, MapHandle, MapLayer};
#[cfg(feature = "http")]
pub use service::HttpImageryService;
pub use service::{CollectionQuery, ImageryService, LocalCollection, RetryPolicy};
pub use solar::{compute_window, compute_window_for_yesterday, DaylightWindow};
