//! Physical unit parsing and conversion.
//!
//! This crate resolves unit strings such as `"m s-1"`, `"degC"` or
//! `"hours since 1970-01-01 00:00:00"` against a process-wide registry and
//! produces value converters between compatible units.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   parse    ┌──────────────┐   to/from base   ┌────────────────┐
//! │  unit string │ ─────────► │     Unit     │ ───────────────► │ UnitsConverter │
//! └──────────────┘            └──────────────┘                  └────────────────┘
//!        │                           ▲                                  │
//!        ▼                           │                                  ▼
//! ┌──────────────────────────────────┴──┐                   linear: scale * x + offset
//! │ UnitSystem (Lazy<Mutex<registry>>) │                   general: evaluated under lock
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use units::UnitSystem;
//!
//! let units = UnitSystem::new()?;
//! let (scale, offset) = units.convert("degC", "K")?;
//! assert!((offset - 273.15).abs() < 1e-9);
//!
//! let conv = units.get_converter("m", "km")?;
//! assert_eq!(conv.convert(1500.0), 1.5);
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod parser;
pub mod registry;
pub mod system;
pub mod unit;

pub use config::UnitSystemConfig;
pub use converter::UnitsConverter;
pub use error::{Result, UnitsError};
pub use registry::{UnitDatabase, UnitDefinition, UnitRegistry};
pub use system::UnitSystem;
pub use unit::{Dimensions, Scale, Unit};
