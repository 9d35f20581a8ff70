use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Color {
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

/// Maps a normalized field magnitude in [0, 1] to a color.
pub trait ColorMap: Sync {
    fn map(&self, t: f64) -> Color;
}

impl<F> ColorMap for F
where
    F: Fn(f64) -> Color + Sync,
{
    fn map(&self, t: f64) -> Color {
        self(t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientKey {
    pub time: f32,
    pub color: Color,
}

/// Piecewise-linear gradient. Keys are kept sorted by `time`; inputs outside
/// the key range take the nearest end color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GradientKey>", into = "Vec<GradientKey>")]
pub struct ColorGradient {
    keys: Vec<GradientKey>,
}

impl ColorGradient {
    pub fn new(mut keys: Vec<GradientKey>) -> Self {
        keys.retain(|k| k.time.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn solid(color: Color) -> Self {
        Self::new(vec![GradientKey { time: 0.0, color }])
    }

    pub fn keys(&self) -> &[GradientKey] {
        &self.keys
    }

    pub fn evaluate(&self, t: f32) -> Color {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Color::WHITE,
        };
        if t.is_nan() || t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }
        // First key strictly after t; t > first.time so idx >= 1.
        let idx = self.keys.partition_point(|k| k.time <= t);
        let lo = &self.keys[idx - 1];
        let hi = &self.keys[idx];
        let span = hi.time - lo.time;
        if span <= 0.0 {
            return hi.color;
        }
        lo.color.lerp(hi.color, (t - lo.time) / span)
    }
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self::new(vec![
            GradientKey {
                time: 0.0,
                color: Color::BLUE,
            },
            GradientKey {
                time: 0.5,
                color: Color::GREEN,
            },
            GradientKey {
                time: 1.0,
                color: Color::RED,
            },
        ])
    }
}

impl From<Vec<GradientKey>> for ColorGradient {
    fn from(keys: Vec<GradientKey>) -> Self {
        Self::new(keys)
    }
}

impl From<ColorGradient> for Vec<GradientKey> {
    fn from(gradient: ColorGradient) -> Self {
        gradient.keys
    }
}

impl ColorMap for ColorGradient {
    fn map(&self, t: f64) -> Color {
        self.evaluate(t as f32)
    }
}
