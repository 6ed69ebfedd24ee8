use crate::geo::ProjectionError;
use crate::raster::RasterError;
use std::fmt::Display;

mod clip;
mod median;
mod summary;

pub use clip::clip;
pub use median::{aggregate, median};
pub use summary::{sample_lattice, summarize};

#[derive(Debug)]
pub enum ReduceError {
    EmptyCollection,
    GridMismatch(String),
    InvalidScale(f64),
    TooManySamples(usize),
    Raster(RasterError),
    Projection(ProjectionError),
}

impl From<RasterError> for ReduceError {
    fn from(e: RasterError) -> Self {
        ReduceError::Raster(e)
    }
}

impl From<ProjectionError> for ReduceError {
    fn from(e: ProjectionError) -> Self {
        ReduceError::Projection(e)
    }
}

impl Display for ReduceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for ReduceError {}

pub type ReduceResult<T> = Result<T, ReduceError>;
