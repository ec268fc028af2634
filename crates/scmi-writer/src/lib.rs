//! SCMI tile writer.
//!
//! Splits gridded satellite products into tiles and writes each tile as an
//! AWIPS-compatible NetCDF-4 file with 16-bit quantized pixels, scaled
//! coordinate variables, a CF grid-mapping variable and SCMI global
//! attributes.

pub mod attributes;
pub mod backend;
pub mod config;
pub mod container;
pub mod encoding;
pub mod error;
pub mod geometry;
pub mod legacy;
pub mod naming;
pub mod projection_attrs;
pub mod quantize;
pub mod tile_file;

pub use attributes::{AttributeContext, AttributeRules, AttributeTable, AttributeValue};
pub use backend::{ScmiBackend, MAX_COORDINATE_POSITIONS};
pub use config::{BackendConfig, OutputRequest, Tiling, DEFAULT_OUTPUT_PATTERN};
pub use container::{ContainerFactory, MemoryFactory, NetCdfFactory, TileContainer};
pub use encoding::{EncodingInfo, EncodingLookup, EncodingTable};
pub use error::{ContainerError, Result, ScmiError};
pub use geometry::{Tile, TileGeometry};
pub use legacy::{Hdf5LegacyPatch, LegacyPatch};
pub use quantize::{QuantizationParams, Quantizer};
