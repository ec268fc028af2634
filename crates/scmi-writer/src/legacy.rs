//! Compatibility patch for old AWIPS NetCDF readers.
//!
//! Newer netCDF-C versions store an `_NCProperties` attribute in the HDF5
//! root group that the AWIPS Java NetCDF library fails to parse. The patch
//! deletes it in place after the file is closed.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::Once;

use hdf5_metno_sys::{h5a, h5e, h5f, h5p};
use tracing::{debug, info};

use crate::error::ContainerError;

/// Root attribute removed by [`Hdf5LegacyPatch`].
pub const NC_PROPERTIES: &str = "_NCProperties";

/// Post-processing step applied to each closed tile file.
pub trait LegacyPatch {
    fn apply(&self, path: &Path) -> Result<(), ContainerError>;
}

/// Silence HDF5's automatic error printing to stderr.
fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: null handlers disable automatic error printing.
        unsafe {
            h5e::H5Eset_auto2(h5e::H5E_DEFAULT, None, std::ptr::null_mut());
        }
    });
}

/// Deletes `_NCProperties` from the root group using the HDF5 C library.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5LegacyPatch;

impl LegacyPatch for Hdf5LegacyPatch {
    fn apply(&self, path: &Path) -> Result<(), ContainerError> {
        silence_hdf5_errors();
        info!(path = %path.display(), "Modifying SCMI NetCDF file to work with AWIPS");

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| ContainerError::Hdf5(format!("path contains NUL: {}", path.display())))?;
        let c_name = CString::new(NC_PROPERTIES)
            .map_err(|_| ContainerError::Hdf5("attribute name contains NUL".to_string()))?;

        // SAFETY: both strings are NUL-terminated and outlive the calls; the
        // file handle is closed on every path after a successful open.
        unsafe {
            let file = h5f::H5Fopen(c_path.as_ptr(), h5f::H5F_ACC_RDWR, h5p::H5P_DEFAULT);
            if file < 0 {
                return Err(ContainerError::Hdf5(format!(
                    "failed to open {} for writing",
                    path.display()
                )));
            }

            let exists = h5a::H5Aexists(file, c_name.as_ptr());
            let result = if exists > 0 {
                if h5a::H5Adelete(file, c_name.as_ptr()) < 0 {
                    Err(ContainerError::Hdf5(format!(
                        "failed to delete {} from {}",
                        NC_PROPERTIES,
                        path.display()
                    )))
                } else {
                    debug!(path = %path.display(), "Removed {}", NC_PROPERTIES);
                    Ok(())
                }
            } else if exists == 0 {
                Ok(())
            } else {
                Err(ContainerError::Hdf5(format!(
                    "failed to query attributes of {}",
                    path.display()
                )))
            };

            if h5f::H5Fclose(file) < 0 && result.is_ok() {
                return Err(ContainerError::Hdf5(format!("failed to close {}", path.display())));
            }
            result
        }
    }
}
