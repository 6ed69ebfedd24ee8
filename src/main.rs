use chrono::NaiveDate;
use clap::Parser;
use cloudndvi::service::ServiceResult;
use cloudndvi::{
    run_pipeline, CloudNdviError, CloudNdviResult, GeoPoint, ImageryService, LocalCollection,
    PipelineParams, RetryPolicy,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::*;

/// Mean daytime NDVI around a point, with an HTML map of the region
#[derive(Parser, Debug)]
#[command(name = "cloudndvi", version, about, allow_negative_numbers = true)]
struct Cli {
    /// Latitude in degrees
    lat: f64,

    /// Longitude in degrees
    lon: f64,

    /// Image collection id
    #[arg(long, default_value = cloudndvi::pipeline::DEFAULT_COLLECTION)]
    collection: String,

    /// Band to request, repeatable [default: CMI_C01 CMI_C02 CMI_C03]
    #[arg(long = "band")]
    bands: Vec<String>,

    /// Region radius in meters
    #[arg(long, default_value_t = cloudndvi::pipeline::DEFAULT_RADIUS_M)]
    radius: f64,

    /// Reference date (YYYY-MM-DD) [default: yesterday]
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Output HTML file
    #[arg(long, default_value = cloudndvi::pipeline::DEFAULT_OUTPUT)]
    output: PathBuf,

    #[arg(long, default_value = cloudndvi::render::DEFAULT_TITLE)]
    title: String,

    #[arg(long, default_value = cloudndvi::render::DEFAULT_WIDTH)]
    width: String,

    #[arg(long, default_value = cloudndvi::render::DEFAULT_HEIGHT)]
    height: String,

    #[arg(long, default_value_t = cloudndvi::render::DEFAULT_ZOOM)]
    zoom: u8,

    /// Sampling scale of the mean, meters
    #[arg(long, default_value_t = cloudndvi::pipeline::DEFAULT_SUMMARY_SCALE_M)]
    scale: f64,

    /// Also render an NDWI layer
    #[arg(long)]
    ndwi: bool,

    /// Per-request timeout, seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Retries of an unavailable service
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Imagery service base URL
    #[arg(long, conflicts_with = "collection_file", required_unless_present = "collection_file")]
    endpoint: Option<String>,

    /// Offline collection, a JSON file of image records
    #[arg(long)]
    collection_file: Option<PathBuf>,

    /// -v info, -vv debug, -vvv trace
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn params(&self) -> CloudNdviResult<PipelineParams> {
        let point = GeoPoint::new(self.lat, self.lon)?;
        let mut params = PipelineParams::new(point)
            .with_collection(self.collection.as_str())
            .with_radius(self.radius)
            .with_output(self.output.clone())
            .with_title(self.title.as_str())
            .with_size(self.width.as_str(), self.height.as_str())
            .with_zoom(self.zoom)
            .with_summary_scale(self.scale)
            .with_ndwi(self.ndwi)
            .with_retry(
                RetryPolicy::default()
                    .with_timeout(Duration::from_secs(self.timeout_secs))
                    .with_max_retries(self.retries),
            );
        if !self.bands.is_empty() {
            params = params.with_bands(self.bands.iter().cloned());
        }
        if let Some(date) = self.date {
            params = params.with_date(date);
        }
        Ok(params)
    }

    async fn service(&self) -> ServiceResult<Box<dyn ImageryService>> {
        if let Some(path) = &self.collection_file {
            return Ok(Box::new(LocalCollection::from_json_file(path).await?));
        }
        self.remote_service()
    }

    #[cfg(feature = "http")]
    fn remote_service(&self) -> ServiceResult<Box<dyn ImageryService>> {
        let endpoint = self.endpoint.as_deref().unwrap_or_default();
        Ok(Box::new(cloudndvi::HttpImageryService::new(endpoint)?))
    }

    #[cfg(not(feature = "http"))]
    fn remote_service(&self) -> ServiceResult<Box<dyn ImageryService>> {
        Err(cloudndvi::service::ServiceError::Rejected((
            0,
            "built without the http feature, use --collection-file".to_string(),
        )))
    }
}

async fn run(cli: &Cli) -> CloudNdviResult<Option<f64>> {
    let params = cli.params()?;
    let service = cli.service().await?;
    let output = run_pipeline(service.as_ref(), &params).await?;
    info!(
        "{} images between {}, map at {}",
        output.image_count,
        output.window,
        output.map.path.display()
    );
    Ok(output.mean_ndvi)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging, stderr only so stdout carries the result
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(Some(mean)) => {
            println!("{mean}");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("None");
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("{e:?}");
            eprintln!("error: {}: {}", e.kind(), detail(&e));
            ExitCode::FAILURE
        }
    }
}

fn detail(e: &CloudNdviError) -> String {
    match e {
        CloudNdviError::DaylightUndefined { date, lat_deg } => {
            format!("no sunrise or sunset on {date} at latitude {lat_deg}")
        }
        CloudNdviError::MissingCalibrationMetadata(band) => format!("no scale/offset for {band}"),
        CloudNdviError::EmptyCollection => "no images in the daylight window".to_string(),
        CloudNdviError::ServiceUnavailable(reason) | CloudNdviError::InvalidRegion(reason) => {
            reason.clone()
        }
        e => format!("{e:?}"),
    }
}
