//! Core types for tetray.
//!
//! This crate provides the pieces shared by every other tetray crate:
//! - [`TetrayError`] and the crate-wide [`Result`] alias
//! - [`RenderOptions`] for pool limits, early termination, and topology policy
//! - [`ObjectId`] / [`ModifiedTime`] change tracking used to memoize rebuilds

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod modified;
pub mod options;

pub use error::{Result, TetrayError};
pub use modified::{ModifiedTime, ObjectId, Stamp, Tracked};
pub use options::{RenderOptions, TopologyPolicy};

// Re-export glam types for convenience
pub use glam::{DMat4, DVec2, DVec3, DVec4};
