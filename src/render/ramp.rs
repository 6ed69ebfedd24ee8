use super::RenderError;
use image::Rgba;
use std::fmt::Display;
use std::str::FromStr;

/// Vegetation palette, red through pale yellow to dark green over NDVI 0..1
pub const NDVI_PALETTE: [&str; 49] = [
    "#8f2723", "#8f2723", "#8f2723", "#8f2723", "#af201b", "#af201b", "#af201b", "#af201b",
    "#ce4a2e", "#ce4a2e", "#ce4a2e", "#ce4a2e", "#df744a", "#df744a", "#df744a", "#df744a",
    "#f0a875", "#f0a875", "#f0a875", "#f0a875", "#fad398", "#fad398", "#fad398", "#fad398",
    "#fff8ba",
    "#d8eda0", "#d8eda0", "#d8eda0", "#d8eda0", "#bddd8a", "#bddd8a", "#bddd8a", "#bddd8a",
    "#93c669", "#93c669", "#93c669", "#93c669", "#5da73e", "#5da73e", "#5da73e", "#5da73e",
    "#3c9427", "#3c9427", "#3c9427", "#3c9427", "#235117", "#235117", "#235117", "#235117",
];

pub const NDWI_PALETTE: [&str; 5] = ["0000ff", "00ffff", "ffff00", "ff0000", "ffffff"];

const CSS_COLORS: [(&str, Rgb); 17] = [
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 128, 0)),
    ("lime", Rgb::new(0, 255, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("aqua", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("orange", Rgb::new(255, 165, 0)),
    ("purple", Rgb::new(128, 0, 128)),
    ("brown", Rgb::new(165, 42, 42)),
    ("gray", Rgb::new(128, 128, 128)),
    ("grey", Rgb::new(128, 128, 128)),
    ("darkgreen", Rgb::new(0, 100, 0)),
    ("navy", Rgb::new(0, 0, 128)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(&self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    pub fn lerp(&self, other: &Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl FromStr for Rgb {
    type Err = RenderError;

    /// `#rrggbb`, `rrggbb`, `#rgb` or a basic CSS color name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        if let Some((_, rgb)) = CSS_COLORS.iter().find(|(name, _)| *name == lower) {
            return Ok(*rgb);
        }
        let hex = lower.strip_prefix('#').unwrap_or(&lower);
        let invalid = || RenderError::InvalidColor(s.to_string());
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize, n: usize| {
            u8::from_str_radix(&hex[i..i + n], 16)
                .map(|v| if n == 1 { v * 17 } else { v })
                .map_err(|_| invalid())
        };
        match hex.len() {
            6 => Ok(Rgb::new(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            3 => Ok(Rgb::new(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?)),
            _ => Err(invalid()),
        }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Evenly spaced color stops stretched linearly over `min..max`
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<Rgb>,
    min: f64,
    max: f64,
}

impl ColorRamp {
    pub fn new(stops: Vec<Rgb>, min: f64, max: f64) -> Result<Self, RenderError> {
        if stops.is_empty() {
            return Err(RenderError::EmptyRamp);
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(RenderError::InvalidRange((min, max)));
        }
        Ok(Self { stops, min, max })
    }

    pub fn from_palette<S: AsRef<str>>(
        palette: &[S],
        min: f64,
        max: f64,
    ) -> Result<Self, RenderError> {
        let stops = palette
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<Rgb>, _>>()?;
        Self::new(stops, min, max)
    }

    pub fn ndvi() -> Result<Self, RenderError> {
        Self::from_palette(&NDVI_PALETTE, 0.0, 1.0)
    }

    pub fn ndwi() -> Result<Self, RenderError> {
        Self::from_palette(&NDWI_PALETTE, 0.0, 1.0)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }

    /// Values outside `min..max` clamp to the end colors
    pub fn color_at(&self, value: f64) -> Rgb {
        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        let last = self.stops.len() - 1;
        if last == 0 || t.is_nan() {
            return self.stops[0];
        }
        let position = t * last as f64;
        let i = (position.floor() as usize).min(last - 1);
        self.stops[i].lerp(&self.stops[i + 1], position - i as f64)
    }

    pub fn css_gradient(&self) -> String {
        let colors: Vec<String> = self.stops.iter().map(|c| c.to_string()).collect();
        if colors.len() == 1 {
            format!("linear-gradient(to right, {0}, {0})", colors[0])
        } else {
            format!("linear-gradient(to right, {})", colors.join(", "))
        }
    }
}
