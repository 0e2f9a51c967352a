//! Named color map presets used to seed color transfer functions.

use std::collections::HashMap;

use glam::DVec3;

/// A color map: color samples evenly spaced over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ColorMap {
    /// Color map name.
    pub name: String,
    /// Color samples (evenly spaced from 0 to 1).
    pub colors: Vec<DVec3>,
}

impl ColorMap {
    /// Creates a new color map.
    pub fn new(name: impl Into<String>, colors: Vec<DVec3>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Samples the color map at a given value (0 to 1).
    pub fn sample(&self, t: f64) -> DVec3 {
        let t = t.clamp(0.0, 1.0);

        if self.colors.is_empty() {
            return DVec3::ZERO;
        }

        if self.colors.len() == 1 {
            return self.colors[0];
        }

        let n = self.colors.len() - 1;
        let idx = (t * n as f64).floor() as usize;
        let idx = idx.min(n - 1);
        let frac = t * n as f64 - idx as f64;

        self.colors[idx].lerp(self.colors[idx + 1], frac)
    }
}

/// Registry of color maps by name.
#[derive(Default)]
pub struct ColorMapRegistry {
    color_maps: HashMap<String, ColorMap>,
}

impl ColorMapRegistry {
    /// Creates a registry holding the built-in presets.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register(ColorMap::new(
            "viridis",
            vec![
                DVec3::new(0.267, 0.004, 0.329),
                DVec3::new(0.282, 0.140, 0.457),
                DVec3::new(0.253, 0.265, 0.529),
                DVec3::new(0.206, 0.371, 0.553),
                DVec3::new(0.163, 0.471, 0.558),
                DVec3::new(0.127, 0.566, 0.550),
                DVec3::new(0.134, 0.658, 0.517),
                DVec3::new(0.266, 0.749, 0.440),
                DVec3::new(0.477, 0.821, 0.318),
                DVec3::new(0.741, 0.873, 0.150),
                DVec3::new(0.993, 0.906, 0.144),
            ],
        ));

        self.register(ColorMap::new(
            "blues",
            vec![
                DVec3::new(0.969, 0.984, 1.000),
                DVec3::new(0.776, 0.859, 0.937),
                DVec3::new(0.419, 0.682, 0.839),
                DVec3::new(0.129, 0.443, 0.710),
                DVec3::new(0.031, 0.188, 0.420),
            ],
        ));

        self.register(ColorMap::new(
            "reds",
            vec![
                DVec3::new(1.000, 0.961, 0.941),
                DVec3::new(0.988, 0.733, 0.631),
                DVec3::new(0.984, 0.416, 0.290),
                DVec3::new(0.796, 0.094, 0.114),
                DVec3::new(0.404, 0.000, 0.051),
            ],
        ));

        self.register(ColorMap::new(
            "coolwarm",
            vec![
                DVec3::new(0.230, 0.299, 0.754),
                DVec3::new(0.552, 0.690, 0.996),
                DVec3::new(0.866, 0.866, 0.866),
                DVec3::new(0.956, 0.604, 0.486),
                DVec3::new(0.706, 0.016, 0.150),
            ],
        ));

        self.register(ColorMap::new(
            "rainbow",
            vec![
                DVec3::new(0.5, 0.0, 1.0),
                DVec3::new(0.0, 0.0, 1.0),
                DVec3::new(0.0, 1.0, 1.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
            ],
        ));
    }

    /// Registers a color map, replacing any map with the same name.
    pub fn register(&mut self, color_map: ColorMap) {
        self.color_maps.insert(color_map.name.clone(), color_map);
    }

    /// Gets a color map by name.
    pub fn get(&self, name: &str) -> Option<&ColorMap> {
        self.color_maps.get(name)
    }

    /// Returns all color map names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.color_maps.keys().map(String::as_str)
    }
}
