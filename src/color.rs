use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
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
// Continuous scale: value → Color32
// ---------------------------------------------------------------------------

/// Sequential light-to-dark blue scale over a value range.
#[derive(Debug, Clone, Copy)]
pub struct BlueScale {
    min: f64,
    max: f64,
}

impl BlueScale {
    const LIGHT: (f32, f32, f32) = (0.87, 0.92, 0.97);
    const DARK: (f32, f32, f32) = (0.03, 0.19, 0.42);

    /// Scale spanning the given values. Empty input gives a degenerate scale.
    pub fn spanning(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            BlueScale { min: 0.0, max: 0.0 }
        } else {
            BlueScale { min, max }
        }
    }

    /// Position of `value` on the scale, clamped to `[0, 1]`.
    pub fn position(&self, value: f64) -> f32 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            return 1.0;
        }
        ((value - self.min) / range).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let (lr, lg, lb) = Self::LIGHT;
        let (dr, dg, db) = Self::DARK;
        // Blend in linear light.
        let light: LinSrgb = Srgb::new(lr, lg, lb).into_linear();
        let dark: LinSrgb = Srgb::new(dr, dg, db).into_linear();
        let mixed = light.mix(dark, self.position(value));
        to_color32(Srgb::from_linear(mixed))
    }
}
