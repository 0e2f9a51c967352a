//! Data structures for tetray.
//!
//! This crate provides the inputs the ray caster consumes:
//! - [`TetMesh`] - object-space points plus tetrahedral (and hexahedral) cells
//! - [`ScalarField`] - per-vertex scalar tuples in their native storage type

// Graphics code intentionally uses casts for indices and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod scalar_field;
pub mod tet_mesh;

pub use scalar_field::{Scalar, ScalarAccess, ScalarArray, ScalarData, ScalarField, ScalarType};
pub use tet_mesh::{CellType, TetMesh, HEX_TO_TET_PATTERN, TET_FACE_STENCIL, UNUSED_SLOT};
