use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: country name → Color32
// ---------------------------------------------------------------------------

/// Maps selected country names to distinct colours for line series.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Build a colour map for the given set of countries.
    pub fn new(countries: &BTreeSet<String>) -> Self {
        let palette = generate_palette(countries.len());
        let mapping = countries.iter().cloned().zip(palette).collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a given country.
    pub fn color_for(&self, country: &str) -> Color32 {
        self.mapping.get(country).copied().unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Sequential scale for the choropleth
// ---------------------------------------------------------------------------

/// "Reds" stops, light to saturated.
const REDS: [(u8, u8, u8); 9] = [
    (0xff, 0xf5, 0xf0),
    (0xfe, 0xe0, 0xd2),
    (0xfc, 0xbb, 0xa1),
    (0xfc, 0x92, 0x72),
    (0xfb, 0x6a, 0x4a),
    (0xef, 0x3b, 0x2c),
    (0xcb, 0x18, 0x1d),
    (0xa5, 0x0f, 0x15),
    (0x67, 0x00, 0x0d),
];

/// Fill for regions that have no value.
pub const NO_DATA: Color32 = Color32::from_gray(200);

/// Maps a value in `[min, max]` onto the Reds gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Scale spanning the given values, `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(ColorScale { min: v, max: v }),
            Some(s) => Some(ColorScale {
                min: s.min.min(v),
                max: s.max.max(v),
            }),
        })
    }

    /// Position of `value` on the scale in `[0, 1]`. A degenerate scale puts
    /// everything at the top.
    pub fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            1.0
        } else {
            ((value - self.min) / range).clamp(0.0, 1.0)
        }
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        reds(self.normalize(value) as f32)
    }
}

/// Sample the Reds gradient at `t ∈ [0, 1]`, interpolating in linear RGB.
pub fn reds(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0) * (REDS.len() - 1) as f32;
    let lo = (t.floor() as usize).min(REDS.len() - 2);
    let frac = t - lo as f32;
    let stop = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = stop(REDS[lo]).mix(stop(REDS[lo + 1]), frac);
    to_color32(Srgb::from_linear(mixed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_distinct() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        let unique: BTreeSet<[u8; 4]> = p.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn color_map_falls_back_to_gray() {
        let countries: BTreeSet<String> = ["Belgium", "Denmark"].map(String::from).into();
        let cm = ColorMap::new(&countries);
        assert_ne!(cm.color_for("Belgium"), cm.color_for("Denmark"));
        assert_eq!(cm.color_for("Chile"), Color32::GRAY);
    }

    #[test]
    fn reds_endpoints() {
        assert_eq!(reds(0.0), Color32::from_rgb(0xff, 0xf5, 0xf0));
        assert_eq!(reds(1.0), Color32::from_rgb(0x67, 0x00, 0x0d));
        assert_eq!(reds(-3.0), reds(0.0));
        // Darker as the value grows.
        assert!(reds(0.75).g() < reds(0.25).g());
    }

    #[test]
    fn scale_normalizes_and_handles_single_value() {
        let scale = ColorScale::from_values([10.0, 30.0, 20.0]).unwrap();
        assert_eq!(scale, ColorScale { min: 10.0, max: 30.0 });
        assert_eq!(scale.normalize(20.0), 0.5);
        assert_eq!(scale.normalize(99.0), 1.0);

        let flat = ColorScale::from_values([5.0]).unwrap();
        assert_eq!(flat.normalize(5.0), 1.0);
        assert!(ColorScale::from_values(std::iter::empty()).is_none());
    }
}
