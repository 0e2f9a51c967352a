//! Piecewise-linear transfer functions.
//!
//! Both function kinds are defined by control points and evaluated by linear
//! interpolation, clamping to the first/last point outside their range. The
//! ray caster never evaluates them per sample: it calls `table` once per
//! rebuild to fill a quantized lookup table.

use glam::DVec3;
use tetray_core::{ModifiedTime, ObjectId, Tracked};

use crate::color_maps::ColorMap;

/// Evenly spaced sample positions over `[min, max]`, as used by `table`.
fn sample_position(min: f64, max: f64, n: usize, i: usize) -> f64 {
    if n < 2 {
        min
    } else {
        min + (max - min) * (i as f64 / (n - 1) as f64)
    }
}

/// Index of the first control point with `x` greater than `value`.
fn upper_index<T>(points: &[(f64, T)], value: f64) -> usize {
    points.partition_point(|(x, _)| *x <= value)
}

/// A scalar → scalar function (opacity, or gray level).
#[derive(Debug, Clone)]
pub struct PiecewiseFunction {
    id: ObjectId,
    mtime: ModifiedTime,
    points: Vec<(f64, f64)>,
}

impl PiecewiseFunction {
    /// Creates an empty function (evaluates to 0 everywhere).
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            mtime: ModifiedTime::now(),
            points: Vec::new(),
        }
    }

    /// A linear ramp from `(x0, y0)` to `(x1, y1)`.
    pub fn ramp(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let mut f = Self::new();
        f.add_point(x0, y0).add_point(x1, y1);
        f
    }

    /// A function that is `y` everywhere.
    pub fn constant(y: f64) -> Self {
        let mut f = Self::new();
        f.add_point(0.0, y);
        f
    }

    /// Adds a control point, replacing an existing point at the same `x`.
    pub fn add_point(&mut self, x: f64, y: f64) -> &mut Self {
        let idx = upper_index(&self.points, x);
        if idx > 0 && self.points[idx - 1].0 == x {
            self.points[idx - 1].1 = y;
        } else {
            self.points.insert(idx, (x, y));
        }
        self.mtime.touch();
        self
    }

    /// Removes every control point.
    pub fn remove_all_points(&mut self) {
        self.points.clear();
        self.mtime.touch();
    }

    /// Control points sorted by `x`.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Evaluates the function.
    pub fn value(&self, x: f64) -> f64 {
        let Some(&(first_x, first_y)) = self.points.first() else {
            return 0.0;
        };
        let idx = upper_index(&self.points, x);
        // NaN compares false against every point and lands here too.
        if idx == 0 || x <= first_x {
            return first_y;
        }
        if idx >= self.points.len() {
            return self.points[self.points.len() - 1].1;
        }
        let (x0, y0) = self.points[idx - 1];
        let (x1, y1) = self.points[idx];
        let t = (x - x0) / (x1 - x0);
        y0 + (y1 - y0) * t
    }

    /// Fills `out` with `out.len()` evenly spaced samples over `[min, max]`.
    pub fn table(&self, min: f64, max: f64, out: &mut [f64]) {
        let n = out.len();
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.value(sample_position(min, max, n, i));
        }
    }
}

impl Default for PiecewiseFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracked for PiecewiseFunction {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn mtime(&self) -> ModifiedTime {
        self.mtime
    }
}

/// A scalar → RGB function.
#[derive(Debug, Clone)]
pub struct ColorTransferFunction {
    id: ObjectId,
    mtime: ModifiedTime,
    points: Vec<(f64, DVec3)>,
}

impl ColorTransferFunction {
    /// Creates an empty function (black everywhere).
    pub fn new() -> Self {
        Self {
            id: ObjectId::new(),
            mtime: ModifiedTime::now(),
            points: Vec::new(),
        }
    }

    /// A function that is `rgb` everywhere.
    pub fn constant(rgb: DVec3) -> Self {
        let mut f = Self::new();
        f.add_rgb_point(0.0, rgb);
        f
    }

    /// Spreads the colors of a color map evenly over `[min, max]`.
    pub fn from_color_map(map: &ColorMap, min: f64, max: f64) -> Self {
        let mut f = Self::new();
        let n = map.colors.len();
        for (i, &c) in map.colors.iter().enumerate() {
            f.add_rgb_point(sample_position(min, max, n, i), c);
        }
        f
    }

    /// Adds a control point, replacing an existing point at the same `x`.
    pub fn add_rgb_point(&mut self, x: f64, rgb: DVec3) -> &mut Self {
        let idx = upper_index(&self.points, x);
        if idx > 0 && self.points[idx - 1].0 == x {
            self.points[idx - 1].1 = rgb;
        } else {
            self.points.insert(idx, (x, rgb));
        }
        self.mtime.touch();
        self
    }

    /// Removes every control point.
    pub fn remove_all_points(&mut self) {
        self.points.clear();
        self.mtime.touch();
    }

    /// Control points sorted by `x`.
    pub fn points(&self) -> &[(f64, DVec3)] {
        &self.points
    }

    /// Evaluates the function.
    pub fn color(&self, x: f64) -> DVec3 {
        let Some(&(first_x, first_c)) = self.points.first() else {
            return DVec3::ZERO;
        };
        let idx = upper_index(&self.points, x);
        // NaN compares false against every point and lands here too.
        if idx == 0 || x <= first_x {
            return first_c;
        }
        if idx >= self.points.len() {
            return self.points[self.points.len() - 1].1;
        }
        let (x0, c0) = self.points[idx - 1];
        let (x1, c1) = self.points[idx];
        c0.lerp(c1, (x - x0) / (x1 - x0))
    }

    /// Fills `out` with `out.len()` evenly spaced samples over `[min, max]`.
    pub fn table(&self, min: f64, max: f64, out: &mut [DVec3]) {
        let n = out.len();
        for (i, c) in out.iter_mut().enumerate() {
            *c = self.color(sample_position(min, max, n, i));
        }
    }
}

impl Default for ColorTransferFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracked for ColorTransferFunction {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn mtime(&self) -> ModifiedTime {
        self.mtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piecewise_interpolation_and_clamping() {
        let f = PiecewiseFunction::ramp(0.0, 0.0, 10.0, 1.0);
        assert_eq!(f.value(-5.0), 0.0);
        assert!((f.value(2.5) - 0.25).abs() < 1e-12);
        assert_eq!(f.value(10.0), 1.0);
        assert_eq!(f.value(50.0), 1.0);
        assert_eq!(PiecewiseFunction::new().value(3.0), 0.0);
    }

    #[test]
    fn test_add_point_keeps_order_and_replaces() {
        let mut f = PiecewiseFunction::new();
        f.add_point(5.0, 0.5).add_point(1.0, 0.1).add_point(3.0, 0.3);
        f.add_point(3.0, 0.9);
        let xs: Vec<f64> = f.points().iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![1.0, 3.0, 5.0]);
        assert_eq!(f.value(3.0), 0.9);
    }

    #[test]
    fn test_table_samples_endpoints() {
        let f = PiecewiseFunction::ramp(0.0, 0.0, 100.0, 1.0);
        let mut out = [0.0; 101];
        f.table(0.0, 100.0, &mut out);
        assert_eq!(out[0], 0.0);
        assert!((out[50] - 0.5).abs() < 1e-12);
        assert_eq!(out[100], 1.0);

        let mut single = [0.0; 1];
        f.table(40.0, 60.0, &mut single);
        assert!((single[0] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_color_function() {
        let mut f = ColorTransferFunction::new();
        f.add_rgb_point(0.0, DVec3::X).add_rgb_point(1.0, DVec3::Z);
        assert_eq!(f.color(-1.0), DVec3::X);
        assert!((f.color(0.5) - DVec3::new(0.5, 0.0, 0.5)).length() < 1e-12);

        let mut out = [DVec3::ZERO; 3];
        f.table(0.0, 1.0, &mut out);
        assert_eq!(out[2], DVec3::Z);
    }

    #[test]
    fn test_from_color_map() {
        let map = ColorMap::new("bw", vec![DVec3::ZERO, DVec3::splat(0.5), DVec3::ONE]);
        let f = ColorTransferFunction::from_color_map(&map, 10.0, 20.0);
        assert_eq!(f.points().len(), 3);
        assert_eq!(f.color(15.0), DVec3::splat(0.5));
        assert!((f.color(17.5) - map.sample(0.75)).length() < 1e-12);
    }

    #[test]
    fn test_nan_argument_clamps_to_first_point() {
        let f = PiecewiseFunction::ramp(0.0, 0.25, 1.0, 0.75);
        assert_eq!(f.value(f64::NAN), 0.25);

        let mut c = ColorTransferFunction::new();
        c.add_rgb_point(0.0, DVec3::X).add_rgb_point(1.0, DVec3::Z);
        assert_eq!(c.color(f64::NAN), DVec3::X);
    }

    #[test]
    fn test_mutation_bumps_mtime() {
        let mut f = PiecewiseFunction::constant(1.0);
        let before = f.mtime();
        f.add_point(2.0, 0.0);
        assert!(f.mtime() > before);
    }
}
