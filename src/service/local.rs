use super::{CollectionQuery, ImageRecord, ImageryService, QueryResponse, ServiceResult};
use crate::raster::RasterImage;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::Path;
use tracing::*;

/// In-memory collection that applies the retrieval filter itself.
/// Records without a collection id belong to every collection.
#[derive(Debug, Clone, Default)]
pub struct LocalCollection {
    records: Vec<ImageRecord>,
}

impl LocalCollection {
    pub fn new(records: Vec<ImageRecord>) -> Self {
        Self { records }
    }

    pub fn with_record(mut self, record: ImageRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Reads a `{"images": [...]}` document, the same shape a service answers with
    pub async fn from_json_file<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let response: QueryResponse = serde_json::from_slice(&bytes)?;
        info!(
            "Loaded {} image records from {}",
            response.images.len(),
            path.as_ref().display()
        );
        Ok(Self::new(response.images))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn select(&self, query: &CollectionQuery) -> ServiceResult<Vec<RasterImage>> {
        let mut images = Vec::new();
        for record in &self.records {
            if record
                .collection
                .as_ref()
                .is_some_and(|c| *c != query.collection)
            {
                continue;
            }
            if !query.window.contains(&record.time) {
                trace!("{} at {} is outside {}", record.id, record.time, query.window);
                continue;
            }
            if let Some(band) = query.bands.iter().find(|b| !record.bands.contains_key(*b)) {
                warn!("Skipping {}: no {band} band", record.id);
                continue;
            }
            let image = record.clone().into_image()?;
            if !query.region.intersects_lat_lon_deg(&image.bounds_lat_lon_deg()?) {
                trace!("{} does not overlap {}", image.id, query.region);
                continue;
            }
            images.push(image.select(&query.bands)?);
        }
        debug!("{} of {} records match", images.len(), self.records.len());
        Ok(images)
    }
}

impl ImageryService for LocalCollection {
    fn query<'a>(
        &'a self,
        query: &'a CollectionQuery,
    ) -> BoxFuture<'a, ServiceResult<Vec<RasterImage>>> {
        async move { self.select(query) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{GeoPoint, RegionOfInterest};
    use crate::service::record::tests::record_json;
    use crate::service::ServiceError;
    use crate::solar::DaylightWindow;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn record(id: &str, time: &str, origin: [f64; 2]) -> ImageRecord {
        let mut value = record_json();
        value["id"] = json!(id);
        value["time"] = json!(time);
        value["origin"] = json!(origin);
        serde_json::from_value(value).unwrap()
    }

    fn query(bands: &[&str]) -> CollectionQuery {
        CollectionQuery {
            collection: "NOAA/GOES/16/MCMIPC".into(),
            window: DaylightWindow {
                start: Utc.with_ymd_and_hms(2024, 6, 21, 11, 34, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2024, 6, 22, 2, 12, 0).unwrap(),
            },
            region: RegionOfInterest::new(GeoPoint::new(37.75, -103.75).unwrap(), 10000.0).unwrap(),
            bands: bands.iter().map(|b| b.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn filters_time_and_footprint() {
        let collection = LocalCollection::default()
            .with_record(record("inside", "2024-06-21T18:00:00Z", [-104.0, 38.0]))
            .with_record(record("at-start", "2024-06-21T11:34:00Z", [-104.0, 38.0]))
            .with_record(record("at-end", "2024-06-22T02:12:00Z", [-104.0, 38.0]))
            .with_record(record("day-before", "2024-06-20T18:00:00Z", [-104.0, 38.0]))
            .with_record(record("elsewhere", "2024-06-21T18:00:00Z", [10.0, 50.0]));
        let images = collection.query(&query(&["CMI_C03"])).await.unwrap();
        let ids: Vec<&str> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["inside", "at-start"]);
        assert_eq!(images[0].band_names().collect::<Vec<_>>(), vec!["CMI_C03"]);
    }

    #[tokio::test]
    async fn filters_collection_and_bands() {
        let mut other = record("other", "2024-06-21T18:00:00Z", [-104.0, 38.0]);
        other.collection = Some("NOAA/GOES/18/MCMIPC".into());
        let mut tagged = record("tagged", "2024-06-21T18:00:00Z", [-104.0, 38.0]);
        tagged.collection = Some("NOAA/GOES/16/MCMIPC".into());
        let collection = LocalCollection::new(vec![other, tagged]);

        let images = collection.select(&query(&["CMI_C02", "CMI_C03"])).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, "tagged");

        // No record holds CMI_C01
        assert!(collection.select(&query(&["CMI_C01", "CMI_C02"])).unwrap().is_empty());
    }

    #[test]
    fn keeps_images_across_antimeridian() {
        let collection = LocalCollection::default()
            .with_record(record("east", "2024-06-21T18:00:00Z", [-180.0, -16.0]))
            .with_record(record("west", "2024-06-21T18:00:00Z", [179.0, -16.0]))
            .with_record(record("far", "2024-06-21T18:00:00Z", [-170.0, -16.0]));
        let mut query = query(&["CMI_C03"]);
        query.region =
            RegionOfInterest::new(GeoPoint::new(-16.5, 179.9).unwrap(), 40_000.0).unwrap();
        let images = collection.select(&query).unwrap();
        let ids: Vec<&str> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["east", "west"]);
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.json");
        std::fs::write(&path, json!({ "images": [record_json()] }).to_string()).unwrap();
        let collection = LocalCollection::from_json_file(&path).await.unwrap();
        assert_eq!(collection.len(), 1);

        std::fs::write(&path, "{\"images\": 3}").unwrap();
        assert!(matches!(
            LocalCollection::from_json_file(&path).await,
            Err(ServiceError::Decode(_))
        ));
        assert!(matches!(
            LocalCollection::from_json_file(dir.path().join("missing.json")).await,
            Err(ServiceError::Io(_))
        ));
    }
}
