//! Gridded burned-area data
//!
//! - [`dataset`]: the in-memory [`GridDataset`]
//! - [`loader`]: reading grid files through the [`GridSource`] trait
//! - [`synthetic`]: seeded sample grids
//! - `netcdf`: the libnetcdf backend (`netcdf` feature)

pub mod dataset;
pub mod loader;
#[cfg(feature = "netcdf")]
pub mod netcdf;
pub mod synthetic;

pub use dataset::{DatasetMetadata, Field, FieldKind, GridDataset};
pub use loader::{load, load_from, AttrValue, GridSource, MemorySource, VariableInfo};
pub use synthetic::{synthesize, synthesize_on};
