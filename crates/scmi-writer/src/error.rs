//! Error types for SCMI tile output.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a tile container implementation.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("HDF5 error: {0}")]
    Hdf5(String),

    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("{0}")]
    Other(String),
}

/// Errors that can occur while producing SCMI tiles for a product.
#[derive(Error, Debug)]
pub enum ScmiError {
    /// Missing encoding entry or an unsupported projection/quantization request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A coordinate axis does not fit the 16-bit coordinate variable.
    #[error("{axis} coordinate has {len} positions, more than the {max} a coordinate variable can address")]
    Capacity {
        axis: &'static str,
        len: usize,
        max: usize,
    },

    /// Destination exists and overwriting is disabled.
    #[error("AWIPS file already exists: {0}")]
    Collision(PathBuf),

    /// Failure inside the file container, passed through unchanged.
    #[error(transparent)]
    Writer(#[from] ContainerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid product: {0}")]
    InvalidProduct(String),
}

impl ScmiError {
    /// Create a Configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an InvalidProduct error.
    pub fn invalid_product(msg: impl Into<String>) -> Self {
        Self::InvalidProduct(msg.into())
    }
}

impl From<scmi_common::CommonError> for ScmiError {
    fn from(err: scmi_common::CommonError) -> Self {
        Self::InvalidProduct(err.to_string())
    }
}

/// Result type for SCMI operations.
pub type Result<T> = std::result::Result<T, ScmiError>;
