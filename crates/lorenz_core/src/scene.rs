//! Presentation defaults handed to renderers: per-trajectory colors and view box.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Piecewise-linear jet colormap: blue at 0, through cyan, yellow, to red at 1.
pub fn jet(value: f64) -> Rgb {
    let v = value.clamp(0.0, 1.0);
    let channel = |center: f64| (1.5 - (4.0 * v - center).abs()).clamp(0.0, 1.0) as f32;
    Rgb::new(channel(3.0), channel(2.0), channel(1.0))
}

/// `count` colors spaced evenly over the whole colormap.
pub fn jet_palette(count: usize) -> Vec<Rgb> {
    match count {
        0 => Vec::new(),
        1 => vec![jet(0.0)],
        _ => (0..count)
            .map(|i| jet(i as f64 / (count - 1) as f64))
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
}

impl Default for AxisLimits {
    fn default() -> Self {
        Self {
            x: (-25.0, 25.0),
            y: (-35.0, 35.0),
            z: (5.0, 55.0),
        }
    }
}

impl AxisLimits {
    /// `[x_min, x_max, y_min, y_max, z_min, z_max]`
    pub fn to_array(&self) -> [f64; 6] {
        [self.x.0, self.x.1, self.y.0, self.y.1, self.z.0, self.z.1]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub limits: AxisLimits,
    pub colors: Vec<Rgb>,
    pub background: Rgb,
    pub show_axes: bool,
}

impl Scene {
    pub fn for_trajectories(count: usize) -> Self {
        Self {
            limits: AxisLimits::default(),
            colors: jet_palette(count),
            background: Rgb::BLACK,
            show_axes: false,
        }
    }
}
