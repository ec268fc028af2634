//! Coordinate reference system transformations.
//!
//! Implements the map projections used by satellite and model grids
//! without external dependencies.

pub mod geostationary;
pub mod lambert;

pub use geostationary::{Geostationary, SweepAxis};
pub use lambert::LambertConformal;
