//! Vector reprojection between grid coordinate systems.
//!
//! Vector quantities such as wind are stored as components along a grid's
//! local axes. When data moves to a grid in another projection the axes turn,
//! so the components must be rotated cell by cell.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   north_angle   ┌────────────────────┐   Arc   ┌──────────────────────────┐
//! │ GridProjection │ ──────────────► │ ReprojectionMatrix │ ──────► │ CachedVectorReprojection │
//! │ (src, target)  │                 │  (one 2x2 / cell)  │         │  u/v pairs, directions   │
//! └────────────────┘                 └────────────────────┘         └──────────────────────────┘
//! ```
//!
//! The matrix is built once per grid pair and shared read-only by every
//! reprojection that uses it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reprojection::{CachedVectorReprojection, LambertConformal, LatLonGrid, ReprojectionMatrix};
//!
//! let target = LatLonGrid::new(50.0, -125.0, -0.25, 0.25, 241, 121);
//! let matrix = ReprojectionMatrix::between(&LambertConformal::hrrr(), &target)?;
//! let reprojection = CachedVectorReprojection::new(Arc::new(matrix));
//! reprojection.reproject_values(&mut u, &mut v, u.len())?;
//! ```

pub mod cached;
pub mod error;
pub mod matrix;
pub mod projection;

pub use cached::CachedVectorReprojection;
pub use error::{ReprojectionError, Result};
pub use matrix::{rotation_angle, ReprojectionMatrix};
pub use projection::{
    GridProjection, Hemisphere, LambertConformal, LambertParams, LatLonGrid, PolarParams,
    PolarStereographic,
};
