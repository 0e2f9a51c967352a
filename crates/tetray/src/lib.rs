//! tetray: volume ray casting of tetrahedral meshes.
//!
//! Rays are cast through an unstructured tetrahedral grid by walking from
//! cell to cell across shared faces, compositing the scalar field's color and
//! opacity along the way.
//!
//! # Quick Start
//!
//! ```no_run
//! use tetray::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let mesh = TetMesh::new_tet_mesh(
//!         vec![
//!             DVec3::new(-1.0, -1.0, 0.0),
//!             DVec3::new(1.0, -1.0, 0.0),
//!             DVec3::new(0.0, 1.0, 0.0),
//!             DVec3::new(0.0, 0.0, -1.0),
//!         ],
//!         vec![[0, 1, 2, 3]],
//!     );
//!     let scalars = ScalarField::new(vec![0.0f32, 0.25, 0.5, 1.0], 1)?;
//!
//!     let mut camera = Camera::new();
//!     camera.look_at(DVec3::new(0.0, 0.0, 4.0), DVec3::ZERO, DVec3::Y);
//!     let property = VolumeProperty::default();
//!
//!     let mut caster = RayCaster::default();
//!     let inputs = RenderInputs::new(
//!         &mesh,
//!         Some(&scalars),
//!         &camera,
//!         &property,
//!         ImageGeometry::full(256, 256),
//!     );
//!     let image = render_image(&mut caster, inputs)?;
//!     image.save("tet.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `tetray-core` - errors, options, change tracking
//! - `tetray-structures` - [`TetMesh`] and [`ScalarField`]
//! - `tetray-render` - camera, transfer functions and the [`RayCaster`]

// Numeric code intentionally uses casts between pixel indices and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod render;
mod rendered_image;

pub use render::{render_image, render_image_with_stats};
pub use rendered_image::{ImageError, RenderedImage, Rgba};

// Re-export core types
pub use tetray_core::{
    DMat4, DVec2, DVec3, DVec4, ModifiedTime, ObjectId, RenderOptions, Result, Stamp,
    TetrayError, TopologyPolicy, Tracked,
};

// Re-export structures
pub use tetray_structures::{
    CellType, Scalar, ScalarAccess, ScalarArray, ScalarData, ScalarField, ScalarType, TetMesh,
};

// Re-export render types
pub use tetray_render::raycast;
pub use tetray_render::{
    BlendMode, Camera, ColorFunction, ColorMap, ColorMapRegistry, ColorTransferFunction,
    ComponentProperty, FaceIndex, ImageGeometry, PiecewiseFunction, ProjectionMode, RayCaster,
    RayOutcome, RenderInputs, RenderPass, RenderStats, VolumeProperty,
};

/// Initializes `env_logger` from `RUST_LOG`. Calling it again is harmless.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::info!("tetray {} logging initialized", env!("CARGO_PKG_VERSION"));
    }
}
