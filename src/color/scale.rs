use serde::Serialize;

use crate::color::palettes::Palette;
use crate::utils::error::{Error, Result};

pub type Rgb = [u8; 3];
pub type Rgba = [u8; 4];

/// Piecewise-linear color scale over a numeric domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    min_value: f64,
    max_value: f64,
    colors: Vec<Rgb>,
}

/// Evenly spaced sample of a scale for drawing a legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub values: Vec<f64>,
    pub colors: Vec<Rgba>,
    pub labels: Vec<String>,
}

impl ColorScale {
    pub fn new(min_value: f64, max_value: f64, colors: Vec<Rgb>) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::EmptyPalette);
        }
        Ok(Self {
            min_value,
            max_value,
            colors,
        })
    }

    pub fn from_palette(min_value: f64, max_value: f64, palette: Palette) -> Self {
        Self {
            min_value,
            max_value,
            colors: palette.anchors().to_vec(),
        }
    }

    /// Scale with the default blue-white-red palette.
    pub fn default_for(min_value: f64, max_value: f64) -> Self {
        Self::from_palette(min_value, max_value, Palette::default())
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Position of `value` in the domain, clamped to `[0, 1]`. A degenerate
    /// domain puts every value at 0.5.
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max_value - self.min_value;
        if range == 0.0 || value.is_nan() {
            return 0.5;
        }
        ((value - self.min_value) / range).clamp(0.0, 1.0)
    }

    /// Interpolated color for `value` with alpha 255.
    pub fn get_color(&self, value: f64) -> Rgba {
        let last = self.colors.len() - 1;
        let position = self.normalize(value) * last as f64;
        let lower = (position.floor() as usize).min(last);
        let upper = (lower + 1).min(last);
        let weight = position - lower as f64;

        let lo = self.colors[lower];
        let hi = self.colors[upper];
        let channel =
            |i: usize| ((1.0 - weight) * lo[i] as f64 + weight * hi[i] as f64) as u8;
        [channel(0), channel(1), channel(2), 255]
    }

    /// `num_stops` evenly spaced values across the domain with labels at
    /// `decimals` places.
    pub fn legend(&self, num_stops: usize, decimals: usize) -> Legend {
        let values = linspace(self.min_value, self.max_value, num_stops);
        let colors = values.iter().map(|&v| self.get_color(v)).collect();
        let labels = values
            .iter()
            .map(|v| format!("{:.*}", decimals, v))
            .collect();
        Legend {
            values,
            colors,
            labels,
        }
    }
}

/// Terrain palette color for an elevation within `[min_elevation, max_elevation]`.
pub fn elevation_to_color(elevation: f64, min_elevation: f64, max_elevation: f64) -> Rgba {
    ColorScale::from_palette(min_elevation, max_elevation, Palette::Terrain).get_color(elevation)
}

/// Colors every value on a scale spanning the data's own extent.
pub fn heatmap_colors(values: &[f64], palette: Palette) -> Vec<Rgba> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        // nothing finite to scale against
        let scale = ColorScale::from_palette(0.0, 0.0, palette);
        return values.iter().map(|&v| scale.get_color(v)).collect();
    }
    let scale = ColorScale::from_palette(min, max, palette);
    values.iter().map(|&v| scale.get_color(v)).collect()
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
