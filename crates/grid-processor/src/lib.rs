//! Uniform, unit-aware access to N-dimensional gridded variables.
//!
//! Backends expose their variables through one data model (dimensions,
//! variables, typed buffers) and one slice-addressing contract. On top of
//! that this crate provides:
//!
//! - **Slicing**: [`SliceSpec`] addresses hyper-rectangular parts of a variable
//! - **Scaled access**: [`ScaledSliceAccess`] reads and writes slices in any
//!   compatible unit, handling packing and missing values
//! - **Processors**: wrappers such as [`DeAccumulate`] and
//!   [`VectorReprojectionProcessor`] transform data on its way out of a source
//!
//! # Architecture
//!
//! ```text
//! caller
//!   │ get_scaled_slice(var, slice, "degC")
//!   ▼
//! ScaledSliceAccess ──► UnitSystem::get_converter(native, target)
//!   │
//!   ▼ read_raw_slice(var, slice)
//! DataSource  (processor ─► processor ─► backend)
//!   │
//!   ├─► MemoryDataset
//!   └─► SerializedSource<non-reentrant backend>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{DataType, Dimension, MemoryDataset, ScaledSliceAccess, Schema, Variable};
//!
//! let schema = Schema::new(
//!     vec![Dimension::growable("time", 1), Dimension::new("x", 3)],
//!     vec![Variable::new("t2m", &["time", "x"], DataType::Float32).with_units("K")],
//! )?;
//! let dataset = MemoryDataset::new(schema)?.with_data("t2m", vec![273.15f32, 283.15, 293.15])?;
//!
//! let access = ScaledSliceAccess::new(dataset)?;
//! let celsius = access.get_scaled_slice("t2m", 0, Some("degC"))?;
//! assert_eq!(celsius.to_f64_vec(), vec![0.0, 10.0, 20.0]);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod packing;
pub mod processor;
pub mod scaled;
pub mod slice;
pub mod source;
pub mod types;

// Re-export commonly used types at crate root
pub use config::{GridProcessorConfig, Narrowing, ScaledOutput};
pub use data::{DataBuffer, Element};
pub use error::{GridProcessorError, Result};
pub use packing::Packing;
pub use processor::{DeAccumulate, VectorReprojectionProcessor};
pub use scaled::{ScaledSliceAccess, SliceSelector};
pub use slice::{DimRange, SliceSpec};
pub use source::{DataSink, DataSource, MemoryDataset, SerializedSource};
pub use types::{DataType, Dimension, Schema, Variable};
