//! Quantized scalar → premultiplied RGBA lookup tables.
//!
//! One table per scalar component. Small integer ranges map one bucket per
//! integer; everything else maps affinely onto [`MAX_TABLE_SIZE`] buckets.
//! Tables are rebuilt only when something they depend on changes.

use glam::{DVec3, DVec4};
use tetray_core::{Stamp, Tracked};
use tetray_structures::{ScalarField, ScalarType};

use crate::volume_property::{BlendMode, ComponentProperty, VolumeProperty, MAX_COMPONENTS};

/// Number of buckets used for float data and wide integer ranges.
pub const MAX_TABLE_SIZE: usize = 65_536;

/// Opacities at or below this are left uncorrected.
const OPACITY_EPSILON: f64 = 1e-4;

/// Table size, shift and scale for a scalar type and `(min, max)` range.
///
/// A value `v` maps to bucket `(v + shift) * scale`.
pub fn table_mapping(scalar_type: ScalarType, (min, max): (f64, f64)) -> (usize, f64, f64) {
    let span = max - min;
    if scalar_type.is_integral() && span + 1.0 <= MAX_TABLE_SIZE as f64 {
        return (span as usize + 1, -min, 1.0);
    }
    let scale = if span > 0.0 {
        (MAX_TABLE_SIZE - 1) as f64 / span
    } else {
        1.0
    };
    (MAX_TABLE_SIZE, -min, scale)
}

/// Adjusts an opacity defined per `unit_distance` to a step of `sample_distance`.
pub fn correct_opacity(opacity: f64, sample_distance: f64, unit_distance: f64) -> f64 {
    if opacity <= OPACITY_EPSILON || unit_distance <= 0.0 {
        return opacity;
    }
    1.0 - (1.0 - opacity).powf(sample_distance / unit_distance)
}

/// The lookup table of one scalar component.
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    rgba: Vec<DVec4>,
    shift: f64,
    scale: f64,
}

impl ComponentTable {
    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.rgba.len()
    }

    /// Whether the table has no buckets.
    pub fn is_empty(&self) -> bool {
        self.rgba.is_empty()
    }

    /// Offset added to a value before scaling.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Factor from shifted value to bucket.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Bucket of a scalar value, clamped to the table.
    #[inline]
    pub fn index(&self, value: f64) -> usize {
        let idx = (value + self.shift) * self.scale;
        // NaN and negatives saturate to 0.
        (idx as usize).min(self.rgba.len().saturating_sub(1))
    }

    /// Premultiplied `(r a, g a, b a, a)` for a scalar value.
    #[inline]
    pub fn lookup(&self, value: f64) -> DVec4 {
        self.rgba
            .get(self.index(value))
            .copied()
            .unwrap_or(DVec4::ZERO)
    }

    fn rebuild(
        &mut self,
        property: &ComponentProperty,
        scalar_type: ScalarType,
        range: (f64, f64),
        correction: Option<f64>,
        colors: &mut Vec<DVec3>,
        opacities: &mut Vec<f64>,
    ) {
        let (size, shift, scale) = table_mapping(scalar_type, range);
        self.shift = shift;
        self.scale = scale;

        colors.clear();
        colors.resize(size, DVec3::ZERO);
        opacities.clear();
        opacities.resize(size, 0.0);
        property.color.table(range.0, range.1, colors);
        property.scalar_opacity.table(range.0, range.1, opacities);

        self.rgba.clear();
        self.rgba.extend(colors.iter().zip(opacities.iter()).map(|(c, &op)| {
            let mut a = op.clamp(0.0, 1.0);
            if let Some(sample_distance) = correction {
                a = correct_opacity(a, sample_distance, property.scalar_opacity_unit_distance);
            }
            (*c * a).extend(a)
        }));
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ComponentKey {
    color: Stamp,
    channels: u8,
    opacity: Stamp,
    unit_distance: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct TableKey {
    scalars: Stamp,
    num_components: usize,
    blend_mode: BlendMode,
    sample_distance: u64,
    components: Vec<ComponentKey>,
}

impl TableKey {
    fn new(
        scalars: &ScalarField,
        property: &VolumeProperty,
        sample_distance: f64,
        blend_mode: BlendMode,
    ) -> Self {
        let num_components = scalars.num_components().min(MAX_COMPONENTS);
        Self {
            scalars: scalars.stamp(),
            num_components,
            blend_mode,
            sample_distance: sample_distance.to_bits(),
            components: property
                .components()
                .iter()
                .take(num_components)
                .map(|c| ComponentKey {
                    color: c.color.stamp(),
                    channels: c.color.channels(),
                    opacity: c.scalar_opacity.stamp(),
                    unit_distance: c.scalar_opacity_unit_distance.to_bits(),
                })
                .collect(),
        }
    }
}

/// Lookup tables for every component of a scalar field.
#[derive(Debug, Clone, Default)]
pub struct ColorOpacityTable {
    tables: Vec<ComponentTable>,
    weights: [f64; MAX_COMPONENTS],
    key: Option<TableKey>,
    rebuilds: usize,
    colors: Vec<DVec3>,
    opacities: Vec<f64>,
}

impl ColorOpacityTable {
    /// An empty table set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the tables up to date. Returns `true` if they were rebuilt.
    ///
    /// `property` must have at least as many components as `scalars`.
    pub fn update(
        &mut self,
        scalars: &ScalarField,
        property: &VolumeProperty,
        sample_distance: f64,
        blend_mode: BlendMode,
    ) -> bool {
        let key = TableKey::new(scalars, property, sample_distance, blend_mode);
        for (w, c) in self.weights.iter_mut().zip(property.components()) {
            *w = c.weight;
        }
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        let correction = (blend_mode == BlendMode::Composite).then_some(sample_distance);
        let scalar_type = scalars.scalar_type();
        self.tables.resize_with(key.num_components, ComponentTable::default);
        for (c, table) in self.tables.iter_mut().enumerate() {
            let Some(component) = property.component(c) else {
                continue;
            };
            table.rebuild(
                component,
                scalar_type,
                scalars.range(c),
                correction,
                &mut self.colors,
                &mut self.opacities,
            );
        }

        self.rebuilds += 1;
        log::debug!(
            "rebuilt color/opacity tables: {} component(s), {} buckets",
            self.tables.len(),
            self.tables.first().map_or(0, ComponentTable::len)
        );
        self.key = Some(key);
        true
    }

    /// Number of component tables.
    pub fn num_components(&self) -> usize {
        self.tables.len()
    }

    /// Table of one component.
    pub fn component(&self, idx: usize) -> Option<&ComponentTable> {
        self.tables.get(idx)
    }

    /// Number of rebuilds so far.
    pub fn num_rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Premultiplied color of a sample with one value per component.
    ///
    /// A single component maps directly. Several are combined as a weighted
    /// sum, with opacity clamped to 1.
    #[inline]
    pub fn classify(&self, values: &[f64]) -> DVec4 {
        match self.tables.as_slice() {
            [table] => table.lookup(values[0]),
            tables => {
                let sum = tables
                    .iter()
                    .zip(values)
                    .zip(self.weights)
                    .fold(DVec4::ZERO, |acc, ((t, &v), w)| acc + t.lookup(v) * w);
                let a = sum.w.clamp(0.0, 1.0);
                sum.truncate().clamp(DVec3::ZERO, DVec3::splat(a)).extend(a)
            }
        }
    }
}
