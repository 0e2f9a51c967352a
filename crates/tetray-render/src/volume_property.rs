//! Per-component appearance of a volume: transfer functions and weights.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tetray_core::{Stamp, Tracked};

use crate::transfer_function::{ColorTransferFunction, PiecewiseFunction};

/// Maximum number of independently mapped scalar components.
pub const MAX_COMPONENTS: usize = 4;

/// How samples along a ray are combined.
///
/// Only `Composite` changes how the opacity table is built (it applies the
/// sample-distance correction); the other modes pass opacity through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Composite,
    MaximumIntensity,
    MinimumIntensity,
}

/// Color function of one component: gray levels or RGB.
#[derive(Debug, Clone)]
pub enum ColorFunction {
    /// One channel, replicated into RGB.
    Gray(PiecewiseFunction),
    /// Three channels.
    Rgb(ColorTransferFunction),
}

impl ColorFunction {
    /// Number of color channels (1 or 3).
    pub fn channels(&self) -> u8 {
        match self {
            ColorFunction::Gray(_) => 1,
            ColorFunction::Rgb(_) => 3,
        }
    }

    /// Change-tracking stamp of the underlying function.
    pub fn stamp(&self) -> Stamp {
        match self {
            ColorFunction::Gray(f) => f.stamp(),
            ColorFunction::Rgb(f) => f.stamp(),
        }
    }

    /// Fills `out` with evenly spaced RGB samples over `[min, max]`.
    pub fn table(&self, min: f64, max: f64, out: &mut [DVec3]) {
        match self {
            ColorFunction::Gray(f) => {
                let mut gray = vec![0.0; out.len()];
                f.table(min, max, &mut gray);
                for (c, g) in out.iter_mut().zip(gray) {
                    *c = DVec3::splat(g);
                }
            }
            ColorFunction::Rgb(f) => f.table(min, max, out),
        }
    }
}

/// Appearance of a single scalar component.
#[derive(Debug, Clone)]
pub struct ComponentProperty {
    /// Scalar → color.
    pub color: ColorFunction,
    /// Scalar → opacity per unit distance.
    pub scalar_opacity: PiecewiseFunction,
    /// World-space distance over which `scalar_opacity` is defined.
    pub scalar_opacity_unit_distance: f64,
    /// Contribution of this component when several are combined.
    pub weight: f64,
}

impl ComponentProperty {
    /// Creates a component with unit distance and weight 1.
    pub fn new(color: ColorFunction, scalar_opacity: PiecewiseFunction) -> Self {
        Self {
            color,
            scalar_opacity,
            scalar_opacity_unit_distance: 1.0,
            weight: 1.0,
        }
    }

    /// Sets the opacity unit distance.
    pub fn with_unit_distance(mut self, distance: f64) -> Self {
        self.scalar_opacity_unit_distance = distance;
        self
    }

    /// Sets the component weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl Default for ComponentProperty {
    /// Gray and opacity ramps over `[0, 1]`.
    fn default() -> Self {
        Self::new(
            ColorFunction::Gray(PiecewiseFunction::ramp(0.0, 0.0, 1.0, 1.0)),
            PiecewiseFunction::ramp(0.0, 0.0, 1.0, 1.0),
        )
    }
}

/// Appearance of a volume, one entry per scalar component.
#[derive(Debug, Clone)]
pub struct VolumeProperty {
    components: Vec<ComponentProperty>,
}

impl VolumeProperty {
    /// A property for single-component scalars.
    pub fn new(component: ComponentProperty) -> Self {
        Self {
            components: vec![component],
        }
    }

    /// A property for multi-component scalars. At most [`MAX_COMPONENTS`] are kept.
    pub fn with_components(mut components: Vec<ComponentProperty>) -> Self {
        if components.len() > MAX_COMPONENTS {
            log::warn!(
                "volume property has {} components, keeping the first {MAX_COMPONENTS}",
                components.len()
            );
            components.truncate(MAX_COMPONENTS);
        }
        Self { components }
    }

    /// Number of configured components.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Appearance of one component.
    pub fn component(&self, idx: usize) -> Option<&ComponentProperty> {
        self.components.get(idx)
    }

    /// Mutable appearance of one component.
    pub fn component_mut(&mut self, idx: usize) -> Option<&mut ComponentProperty> {
        self.components.get_mut(idx)
    }

    /// All components.
    pub fn components(&self) -> &[ComponentProperty] {
        &self.components
    }
}

impl Default for VolumeProperty {
    fn default() -> Self {
        Self::new(ComponentProperty::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_replicated_into_rgb() {
        let color = ColorFunction::Gray(PiecewiseFunction::ramp(0.0, 0.0, 1.0, 1.0));
        assert_eq!(color.channels(), 1);
        let mut out = [DVec3::ZERO; 3];
        color.table(0.0, 1.0, &mut out);
        assert_eq!(out[1], DVec3::splat(0.5));
    }

    #[test]
    fn test_component_limit() {
        let property = VolumeProperty::with_components(vec![ComponentProperty::default(); 6]);
        assert_eq!(property.num_components(), MAX_COMPONENTS);
        assert!(property.component(3).is_some());
        assert!(property.component(4).is_none());
    }

    #[test]
    fn test_component_builder() {
        let c = ComponentProperty::default()
            .with_unit_distance(0.5)
            .with_weight(0.25);
        assert_eq!(c.scalar_opacity_unit_distance, 0.5);
        assert_eq!(c.weight, 0.25);
        assert_eq!(VolumeProperty::default().num_components(), 1);
    }
}
