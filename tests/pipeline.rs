use chrono::NaiveDate;
use cloudndvi::raster::RasterImage;
use cloudndvi::service::{CollectionQuery, ImageRecord, ServiceError, ServiceResult};
use cloudndvi::{
    run_pipeline, CloudNdviError, GeoPoint, ImageryService, LocalCollection, PipelineParams,
    RetryPolicy,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const SIZE: u32 = 66;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
}

/// 66 x 66 geographic grid around (37.25, -102.84), constant counts
fn record(
    id: &str,
    time: &str,
    nir: Option<f64>,
    red: Option<f64>,
    blue: Option<f64>,
) -> ImageRecord {
    let n = (SIZE * SIZE) as usize;
    let (nir, red, blue) = (vec![nir; n], vec![red; n], vec![blue; n]);
    serde_json::from_value(json!({
        "id": id,
        "collection": "NOAA/GOES/16/MCMIPC",
        "time": time,
        "epsg": 4326,
        "origin": [-103.5, 37.9],
        "pixel_scale": [0.02, 0.02],
        "width": SIZE,
        "height": SIZE,
        "bands": {
            "CMI_C01": blue,
            "CMI_C02": red,
            "CMI_C03": nir,
        },
        "properties": {
            "CMI_C01_scale": 0.0001, "CMI_C01_offset": 0.0,
            "CMI_C02_scale": 0.0001, "CMI_C02_offset": 0.0,
            "CMI_C03_scale": 0.0001, "CMI_C03_offset": 0.0,
        }
    }))
    .unwrap()
}

/// NDVI 0.5 everywhere
fn vegetated(id: &str, time: &str) -> ImageRecord {
    record(id, time, Some(3000.0), Some(1000.0), Some(800.0))
}

fn fixture() -> LocalCollection {
    LocalCollection::default()
        .with_record(vegetated("midday", "2024-06-21T18:00:00Z"))
        .with_record(vegetated("afternoon", "2024-06-21T20:00:00Z"))
        .with_record(record("night", "2024-06-21T05:00:00Z", Some(0.0), Some(3000.0), Some(0.0)))
}

fn params(output: &Path) -> PipelineParams {
    PipelineParams::new(GeoPoint::new(37.25, -102.84).unwrap())
        .with_date(date())
        .with_output(output)
        .with_retry(
            RetryPolicy::default()
                .with_timeout(Duration::from_millis(500))
                .with_base_delay(Duration::from_millis(1)),
        )
}

#[tokio::test]
async fn end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ROI_NDVI.html");
    let output = run_pipeline(&fixture(), &params(&path)).await.unwrap();

    let mean = output.mean_ndvi.unwrap();
    assert!((-1.0..=1.0).contains(&mean));
    assert!((mean - 0.5).abs() < 1e-9, "mean {mean}");
    assert_eq!(output.image_count, 2);
    assert_eq!(output.window.start.date_naive(), date());
    assert!(output.window.end > output.window.start);

    assert_eq!(output.map.path, path);
    assert_eq!(output.map.title, "My Map");
    assert_eq!(output.map.zoom, 10);
    assert_eq!(output.map.center, (37.25, -102.84));
    assert_eq!(output.map.layers, vec!["NDVI".to_string()]);

    let html = std::fs::read_to_string(&path).unwrap();
    assert!(!html.is_empty());
    assert_eq!(html.len(), output.map.bytes);
    assert!(html.contains("L.imageOverlay('data:image/png;base64,"));
    assert!(html.contains("NDVI_median"));
    assert!(html.contains("height: 880px"));
    assert!(!html.contains("NDWI"));
}

#[tokio::test]
async fn ndwi_layer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    let output = run_pipeline(&fixture(), &params(&path).with_ndwi(true).with_title("Both"))
        .await
        .unwrap();
    assert_eq!(output.map.layers, vec!["NDVI".to_string(), "NDWI".to_string()]);
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("NDWI_median"));
    assert!(html.contains("<title>Both</title>"));
}

#[tokio::test]
async fn all_masked_gives_no_mean() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    let collection = LocalCollection::default()
        .with_record(record("cloudy", "2024-06-21T18:00:00Z", None, None, None));
    let output = run_pipeline(&collection, &params(&path)).await.unwrap();
    assert_eq!(output.mean_ndvi, None);
    assert!(path.exists());
}

#[tokio::test]
async fn empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    let params = params(&path).with_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let err = run_pipeline(&fixture(), &params).await.unwrap_err();
    assert!(matches!(err, CloudNdviError::EmptyCollection));
    assert_eq!(err.kind(), "EmptyCollection");
    assert!(!path.exists());
}

#[tokio::test]
async fn polar_night() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    let mut params = params(&path).with_date(NaiveDate::from_ymd_opt(2024, 12, 21).unwrap());
    params.point = GeoPoint::new(78.2, 15.6).unwrap();
    let err = run_pipeline(&fixture(), &params).await.unwrap_err();
    assert_eq!(err.kind(), "DaylightUndefined");
    assert!(!path.exists());
}

#[tokio::test]
async fn missing_calibration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    let mut uncalibrated = vegetated("raw", "2024-06-21T18:00:00Z");
    uncalibrated.properties.clear();
    let err = run_pipeline(&LocalCollection::new(vec![uncalibrated]), &params(&path))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CloudNdviError::MissingCalibrationMetadata(ref band) if band == "CMI_C01"
    ));
    assert!(!path.exists());
}

#[tokio::test]
async fn invalid_region() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    let err = run_pipeline(&fixture(), &params(&path).with_radius(0.0)).await.unwrap_err();
    assert_eq!(err.kind(), "InvalidRegion");
    let err = run_pipeline(&fixture(), &params(&path).with_summary_scale(-5.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "InvalidRegion");
    assert!(!path.exists());
}

/// Fails with a fixed error for the first `failures` calls, then answers from a local collection
struct FlakyService {
    inner: LocalCollection,
    failures: u32,
    error: fn() -> ServiceError,
    calls: AtomicU32,
}

impl FlakyService {
    fn new(failures: u32, error: fn() -> ServiceError) -> Self {
        Self {
            inner: fixture(),
            failures,
            error,
            calls: AtomicU32::new(0),
        }
    }
}

impl ImageryService for FlakyService {
    fn query<'a>(
        &'a self,
        query: &'a CollectionQuery,
    ) -> BoxFuture<'a, ServiceResult<Vec<RasterImage>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            let error = (self.error)();
            async move { Err(error) }.boxed()
        } else {
            self.inner.query(query)
        }
    }
}

fn unavailable() -> ServiceError {
    ServiceError::Unavailable("503".into())
}

fn rejected() -> ServiceError {
    ServiceError::Rejected((400, "unknown collection".into()))
}

#[tokio::test]
async fn flaky_service_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let service = FlakyService::new(3, unavailable);
    let output = run_pipeline(&service, &params(&dir.path().join("map.html")))
        .await
        .unwrap();
    assert!(output.mean_ndvi.is_some());
    assert_eq!(service.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn unavailable_service() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.html");
    let service = FlakyService::new(u32::MAX, unavailable);
    let err = run_pipeline(&service, &params(&path)).await.unwrap_err();
    assert_eq!(err.kind(), "ServiceUnavailable");
    assert_eq!(service.calls.load(Ordering::SeqCst), 4);
    assert!(!path.exists());
}

#[tokio::test]
async fn rejected_query_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let service = FlakyService::new(u32::MAX, rejected);
    let err = run_pipeline(&service, &params(&dir.path().join("map.html")))
        .await
        .unwrap_err();
    assert!(matches!(err, CloudNdviError::Service(ServiceError::Rejected((400, _)))));
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);
}

struct SlowService;

impl ImageryService for SlowService {
    fn query<'a>(
        &'a self,
        _query: &'a CollectionQuery,
    ) -> BoxFuture<'a, ServiceResult<Vec<RasterImage>>> {
        async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
        .boxed()
    }
}

#[tokio::test]
async fn timeout_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let retry = RetryPolicy::default()
        .with_timeout(Duration::from_millis(20))
        .with_max_retries(1)
        .with_base_delay(Duration::from_millis(1));
    let params = params(&dir.path().join("map.html")).with_retry(retry);
    let err = run_pipeline(&SlowService, &params).await.unwrap_err();
    assert_eq!(err.kind(), "ServiceUnavailable");
}

#[tokio::test]
async fn collection_file() {
    let dir = tempfile::tempdir().unwrap();
    let collection_path = dir.path().join("collection.json");
    let records = vec![vegetated("midday", "2024-06-21T18:00:00Z")];
    let document = json!({ "images": records }).to_string();
    std::fs::write(&collection_path, document).unwrap();

    let collection = LocalCollection::from_json_file(&collection_path).await.unwrap();
    let output = run_pipeline(&collection, &params(&dir.path().join("map.html")))
        .await
        .unwrap();
    assert!((output.mean_ndvi.unwrap() - 0.5).abs() < 1e-9);
}
