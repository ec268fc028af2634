//! File containers that tile files are written into.
//!
//! [`TileContainer`] covers the handful of dimension, variable and attribute
//! operations an SCMI tile needs. The global attribute namespace is exposed
//! through [`AttributeTarget`].

pub mod memory;
pub mod netcdf4;

use std::path::Path;

use crate::attributes::{AttributeTarget, AttributeValue};
use crate::error::ContainerError;

pub use self::memory::{MemoryContainer, MemoryFactory, MemoryVariable, VariableData};
pub use self::netcdf4::{NetCdfContainer, NetCdfFactory};

/// Result type for container operations.
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// Element type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    U16,
    I16,
    I32,
}

/// Declaration of a variable.
#[derive(Debug, Clone)]
pub struct VariableSpec<'a> {
    pub name: &'a str,
    pub var_type: VariableType,
    /// Dimension names; empty for a scalar
    pub dims: &'a [&'a str],
    pub fill_value: Option<i64>,
    pub compress: bool,
}

/// An open output file.
pub trait TileContainer: AttributeTarget {
    fn add_dimension(&mut self, name: &str, len: usize) -> ContainerResult<()>;

    fn add_variable(&mut self, spec: &VariableSpec<'_>) -> ContainerResult<()>;

    fn put_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: AttributeValue,
    ) -> ContainerResult<()>;

    fn put_u16_values(&mut self, variable: &str, values: &[u16]) -> ContainerResult<()>;

    fn put_i16_values(&mut self, variable: &str, values: &[i16]) -> ContainerResult<()>;

    /// Flush and close the file.
    fn close(self: Box<Self>) -> ContainerResult<()>;
}

/// Creates containers at a path.
pub trait ContainerFactory {
    fn create(&self, path: &Path) -> ContainerResult<Box<dyn TileContainer>>;
}
