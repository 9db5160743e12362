//! Processors: sources that transform the data of another source.
//!
//! Each processor owns the source it wraps and implements [`DataSource`]
//! itself, so processors stack and [`ScaledSliceAccess`] works on top of
//! any of them. Variables a processor was not told about pass through
//! untouched.
//!
//! [`DataSource`]: crate::source::DataSource
//! [`ScaledSliceAccess`]: crate::scaled::ScaledSliceAccess

mod deaccumulate;
mod vector;

pub use deaccumulate::DeAccumulate;
pub use vector::VectorReprojectionProcessor;
