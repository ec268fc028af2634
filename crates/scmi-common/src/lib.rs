//! Common types shared by the SCMI tiling crates.
//!
//! A [`GriddedProduct`] is one 2D raster with a validity mask and the
//! [`GridDefinition`] it was projected onto.

pub mod error;
pub mod grid;
pub mod product;

pub use error::{CommonError, CommonResult};
pub use grid::{GridDefinition, ProjFamily, ProjParams};
pub use product::{GriddedProduct, ProductInfo};
