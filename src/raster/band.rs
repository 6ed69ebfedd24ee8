use super::{RasterError, RasterResult};

/// One image plane, row-major. `None` is a masked pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    pub dimensions: (u32, u32),
    data: Vec<Option<f64>>,
}

impl Band {
    /// Non-finite values are stored as masked
    pub fn new(dimensions: (u32, u32), data: Vec<Option<f64>>) -> RasterResult<Self> {
        let required = dimensions.0 as usize * dimensions.1 as usize;
        if data.len() != required {
            return Err(RasterError::BufferSize((data.len(), dimensions)));
        }
        let data = data
            .into_iter()
            .map(|v| v.filter(|v| v.is_finite()))
            .collect();
        Ok(Self { dimensions, data })
    }

    pub fn from_values(dimensions: (u32, u32), values: Vec<f64>) -> RasterResult<Self> {
        Self::new(dimensions, values.into_iter().map(Some).collect())
    }

    pub fn masked(dimensions: (u32, u32)) -> Self {
        Self {
            dimensions,
            data: vec![None; dimensions.0 as usize * dimensions.1 as usize],
        }
    }

    pub fn filled(dimensions: (u32, u32), value: f64) -> Self {
        let value = Some(value).filter(|v| v.is_finite());
        Self {
            dimensions,
            data: vec![value; dimensions.0 as usize * dimensions.1 as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[Option<f64>] {
        &self.data
    }

    /// `None` for masked pixels and for indices outside the band
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.dimensions.0 || y >= self.dimensions.1 {
            return None;
        }
        self.data[self.index(x, y)]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, value: Option<f64>) -> RasterResult<()> {
        if x >= self.dimensions.0 || y >= self.dimensions.1 {
            return Err(RasterError::PixelOutOfRange((x, y)));
        }
        let i = self.index(x, y);
        self.data[i] = value.filter(|v| v.is_finite());
        Ok(())
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, Option<f64>> {
        self.data.chunks_exact(self.dimensions.0.max(1) as usize)
    }

    /// Applies `f` to every valid pixel, masked pixels stay masked
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Band {
        Band {
            dimensions: self.dimensions,
            data: self
                .data
                .iter()
                .map(|v| v.map(&f).filter(|v| v.is_finite()))
                .collect(),
        }
    }

    /// Masks every pixel whose `keep` entry is false
    pub fn apply_mask(&self, keep: &[bool]) -> RasterResult<Band> {
        if keep.len() != self.data.len() {
            return Err(RasterError::BufferSize((keep.len(), self.dimensions)));
        }
        Ok(Band {
            dimensions: self.dimensions,
            data: self
                .data
                .iter()
                .zip(keep)
                .map(|(v, keep)| if *keep { *v } else { None })
                .collect(),
        })
    }

    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flatten().copied()
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }

    pub fn masked_count(&self) -> usize {
        self.data.len() - self.valid_count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.dimensions.0 as usize + x as usize
    }
}
