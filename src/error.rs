use crate::geo::GeoError;
use crate::index::IndexError;
use crate::raster::{CalibrationError, RasterError};
use crate::reduce::ReduceError;
use crate::render::RenderError;
use crate::service::ServiceError;
use crate::solar::SolarError;
use chrono::NaiveDate;

#[derive(Debug)]
pub enum CloudNdviError {
    DaylightUndefined { date: NaiveDate, lat_deg: f64 },
    MissingCalibrationMetadata(String),
    EmptyCollection,
    ServiceUnavailable(String),
    InvalidRegion(String),
    Solar(SolarError),
    Calibration(CalibrationError),
    Raster(RasterError),
    Index(IndexError),
    Reduce(ReduceError),
    Service(ServiceError),
    Render(RenderError),
    Io(std::io::Error),
}

pub type CloudNdviResult<T> = Result<T, CloudNdviError>;

impl CloudNdviError {
    /// Error kind name for user-facing reports
    pub fn kind(&self) -> &'static str {
        match self {
            CloudNdviError::DaylightUndefined { .. } => "DaylightUndefined",
            CloudNdviError::MissingCalibrationMetadata(_) => "MissingCalibrationMetadata",
            CloudNdviError::EmptyCollection => "EmptyCollection",
            CloudNdviError::ServiceUnavailable(_) => "ServiceUnavailable",
            CloudNdviError::InvalidRegion(_) => "InvalidRegion",
            CloudNdviError::Solar(_) => "Solar",
            CloudNdviError::Calibration(_) => "Calibration",
            CloudNdviError::Raster(_) => "Raster",
            CloudNdviError::Index(_) => "Index",
            CloudNdviError::Reduce(_) => "Reduce",
            CloudNdviError::Service(_) => "Service",
            CloudNdviError::Render(_) => "Render",
            CloudNdviError::Io(_) => "Io",
        }
    }
}

impl From<SolarError> for CloudNdviError {
    fn from(e: SolarError) -> Self {
        match e {
            SolarError::DaylightUndefined { date, lat_deg } => {
                CloudNdviError::DaylightUndefined { date, lat_deg }
            }
            e => CloudNdviError::Solar(e),
        }
    }
}

impl From<GeoError> for CloudNdviError {
    fn from(e: GeoError) -> Self {
        CloudNdviError::InvalidRegion(format!("{e:?}"))
    }
}

impl From<CalibrationError> for CloudNdviError {
    fn from(e: CalibrationError) -> Self {
        match e {
            CalibrationError::MissingCalibrationMetadata(band) => {
                CloudNdviError::MissingCalibrationMetadata(band)
            }
            e => CloudNdviError::Calibration(e),
        }
    }
}

impl From<RasterError> for CloudNdviError {
    fn from(e: RasterError) -> Self {
        CloudNdviError::Raster(e)
    }
}

impl From<IndexError> for CloudNdviError {
    fn from(e: IndexError) -> Self {
        CloudNdviError::Index(e)
    }
}

impl From<ReduceError> for CloudNdviError {
    fn from(e: ReduceError) -> Self {
        match e {
            ReduceError::EmptyCollection => CloudNdviError::EmptyCollection,
            ReduceError::InvalidScale(_) | ReduceError::TooManySamples(_) => {
                CloudNdviError::InvalidRegion(format!("{e:?}"))
            }
            e => CloudNdviError::Reduce(e),
        }
    }
}

impl From<ServiceError> for CloudNdviError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unavailable(reason) => CloudNdviError::ServiceUnavailable(reason),
            ServiceError::Calibration(e) => e.into(),
            e => CloudNdviError::Service(e),
        }
    }
}

impl From<RenderError> for CloudNdviError {
    fn from(e: RenderError) -> Self {
        CloudNdviError::Render(e)
    }
}

impl From<std::io::Error> for CloudNdviError {
    fn from(e: std::io::Error) -> Self {
        CloudNdviError::Io(e)
    }
}

impl std::fmt::Display for CloudNdviError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for CloudNdviError {}
