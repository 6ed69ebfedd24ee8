use super::{CollectionQuery, ServiceResult};
use crate::geo::GridProjection;
use crate::geo::WGS84_EPSG;
use crate::raster::{Band, CalibrationTable, RasterImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_epsg() -> u16 {
    WGS84_EPSG
}

/// Wire form of one image: grid, band values (`null` = masked) and flat metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub time: DateTime<Utc>,
    #[serde(default = "default_epsg")]
    pub epsg: u16,
    pub origin: [f64; 2],
    pub pixel_scale: [f64; 2],
    pub width: u32,
    pub height: u32,
    pub bands: BTreeMap<String, Vec<Option<f64>>>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl ImageRecord {
    /// Numeric metadata only
    pub fn numeric_properties(&self) -> BTreeMap<String, f64> {
        self.properties
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|v| (k.clone(), v)))
            .collect()
    }

    pub fn into_image(self) -> ServiceResult<RasterImage> {
        let projection = GridProjection::new(
            self.epsg,
            (self.origin[0], self.origin[1]),
            (self.pixel_scale[0], self.pixel_scale[1]),
        )?;
        let calibration = CalibrationTable::from_metadata(&self.numeric_properties())?;
        let dimensions = (self.width, self.height);
        let mut image = RasterImage::new(self.id, self.time, projection, dimensions)
            .with_calibration(calibration);
        for (name, values) in self.bands {
            image.add_band(name, Band::new(dimensions, values)?)?;
        }
        Ok(image)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRequest {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
}

/// JSON body of a collection query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub collection: String,
    pub start: String,
    pub end: String,
    pub region: RegionRequest,
    pub bands: Vec<String>,
}

impl From<&CollectionQuery> for QueryRequest {
    fn from(query: &CollectionQuery) -> Self {
        let center = query.region.center();
        Self {
            collection: query.collection.clone(),
            start: query.window.start_str(),
            end: query.window.end_str(),
            region: RegionRequest {
                lat: center.lat_deg(),
                lon: center.lon_deg(),
                radius_m: query.region.radius_m(),
            },
            bands: query.bands.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub images: Vec<ImageRecord>,
}
