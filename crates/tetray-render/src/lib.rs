//! Rendering for tetray.
//!
//! This crate provides:
//! - [`Camera`] and [`ImageGeometry`] describing the view
//! - [`PiecewiseFunction`] / [`ColorTransferFunction`] transfer functions and
//!   the [`ColorMapRegistry`] presets used to seed them
//! - [`VolumeProperty`] per-component appearance
//! - the [`raycast`] engine and its [`RayCaster`] / [`RenderPass`] entry points

// Numeric code intentionally uses casts between pixel indices and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Render state structs carry many scalar fields
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]

pub mod camera;
pub mod color_maps;
pub mod raycast;
pub mod transfer_function;
pub mod volume_property;

pub use camera::{Camera, ImageGeometry, ProjectionMode};
pub use color_maps::{ColorMap, ColorMapRegistry};
pub use raycast::{
    ColorOpacityTable, FaceIndex, RasterStats, RayCaster, RayOutcome, RenderInputs, RenderPass,
    RenderStats,
};
pub use transfer_function::{ColorTransferFunction, PiecewiseFunction};
pub use volume_property::{
    BlendMode, ColorFunction, ComponentProperty, VolumeProperty, MAX_COMPONENTS,
};
