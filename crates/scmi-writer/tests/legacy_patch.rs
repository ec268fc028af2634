//! `_NCProperties` removal on real NetCDF-4 files.
//!
//! Kept in its own test binary: the patch talks to HDF5 directly, outside
//! the netcdf crate's global lock.

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use hdf5_metno_sys::{h5a, h5f, h5p};
use scmi_writer::legacy::NC_PROPERTIES;
use scmi_writer::{BackendConfig, EncodingTable, Hdf5LegacyPatch, LegacyPatch, OutputRequest, ScmiBackend};
use test_utils::{lcc_grid, synthetic_product};

fn has_root_attribute(path: &Path, name: &str) -> bool {
    let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
    let c_name = CString::new(name).unwrap();
    unsafe {
        let file = h5f::H5Fopen(c_path.as_ptr(), h5f::H5F_ACC_RDONLY, h5p::H5P_DEFAULT);
        assert!(file >= 0, "failed to open {}", path.display());
        let exists = h5a::H5Aexists(file, c_name.as_ptr());
        h5f::H5Fclose(file);
        assert!(exists >= 0);
        exists > 0
    }
}

#[test]
fn test_fix_awips_strips_nc_properties() {
    let dir = tempfile::tempdir().unwrap();
    let config = BackendConfig {
        fix_awips: true,
        organization: Some("SSEC".to_string()),
        ..BackendConfig::default()
    };
    let mut backend = ScmiBackend::new(config, EncodingTable::builtin());
    let mut product = synthetic_product(lcc_grid(3, 3), |r, c| (r * 3 + c) as f32);
    let request = OutputRequest {
        output_dir: dir.path().to_path_buf(),
        ..OutputRequest::default()
    };

    let path = backend
        .create_output_from_product(&mut product, &request)
        .unwrap()
        .unwrap();
    assert!(!has_root_attribute(&path, NC_PROPERTIES));

    // Patching again is a no-op
    Hdf5LegacyPatch.apply(&path).unwrap();

    // The file is still readable NetCDF
    let file = netcdf::open(&path).unwrap();
    let codes: Vec<u16> = file.variable("data").unwrap().get_values(..).unwrap();
    assert_eq!(codes.len(), 9);

    let missing = dir.path().join("missing.nc");
    assert!(Hdf5LegacyPatch.apply(&missing).is_err());
}
