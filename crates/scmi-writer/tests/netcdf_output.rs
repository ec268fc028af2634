//! Tile files written through the NetCDF-4 container.

use scmi_writer::{BackendConfig, EncodingTable, OutputRequest, ScmiBackend, Tiling};
use test_utils::{assert_approx_eq, goes_grid, lcc_grid, synthetic_product};

fn backend(compress: bool) -> ScmiBackend {
    let config = BackendConfig {
        compress,
        organization: Some("SSEC".to_string()),
        ..BackendConfig::default()
    };
    ScmiBackend::new(config, EncodingTable::builtin())
}

fn f64_attr(var: &netcdf::Variable, name: &str) -> f64 {
    let value = var
        .attribute_value(name)
        .unwrap_or_else(|| panic!("missing {}", name))
        .unwrap();
    f64::try_from(value).unwrap()
}

fn text_attr(value: netcdf::AttributeValue) -> String {
    match value {
        netcdf::AttributeValue::Str(s) => s,
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_lambert_tiles_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut product = synthetic_product(lcc_grid(4, 6), |r, c| 200.0 + (r * 6 + c) as f32);
    let request = OutputRequest {
        tiling: Tiling::Count { rows: 2, cols: 2 },
        output_dir: dir.path().to_path_buf(),
        ..OutputRequest::default()
    };

    let last = backend(true)
        .create_output_from_product(&mut product, &request)
        .unwrap()
        .unwrap();
    assert!(last.ends_with("SSEC_AWIPS_goes16_abi_ch13_LCC_T004_20240501_1800.nc"));

    let path = dir
        .path()
        .join("SSEC_AWIPS_goes16_abi_ch13_LCC_T002_20240501_1800.nc");
    let file = netcdf::open(&path).unwrap();
    assert_eq!(file.dimension("y").unwrap().len(), 2);
    assert_eq!(file.dimension("x").unwrap().len(), 3);

    let data = file.variable("data").unwrap();
    let codes: Vec<u16> = data.get_values(..).unwrap();
    let scale = f64_attr(&data, "scale_factor");
    let offset = f64_attr(&data, "add_offset");
    // Tile 2 covers rows 0..2, columns 3..6
    let expected = [203.0, 204.0, 205.0, 209.0, 210.0, 211.0];
    for (code, want) in codes.iter().zip(expected) {
        assert_approx_eq!(*code as f64 * scale + offset, want, 1e-3);
    }
    assert_eq!(
        text_attr(data.attribute_value("grid_mapping").unwrap().unwrap()),
        "lambert_projection"
    );

    let x = file.variable("x").unwrap();
    let x_codes: Vec<i16> = x.get_values(..).unwrap();
    assert_eq!(x_codes, vec![3, 4, 5]);
    assert_approx_eq!(f64_attr(&x, "scale_factor"), 3000.0, 1e-9);

    let projection = file.variable("lambert_projection").unwrap();
    assert_approx_eq!(f64_attr(&projection, "standard_parallel"), 25.0, 1e-9);

    let tile_number = file.attribute("tile_number").unwrap().value().unwrap();
    assert_eq!(i32::try_from(tile_number).unwrap(), 2);
    let conventions = file.attribute("Conventions").unwrap().value().unwrap();
    assert_eq!(text_attr(conventions), "CF-1.7");
}

#[test]
fn test_geostationary_coordinates_in_microradians() {
    let dir = tempfile::tempdir().unwrap();
    let mut product = synthetic_product(goes_grid(4, 4), |r, c| (r + c) as f32);
    let request = OutputRequest {
        output_dir: dir.path().to_path_buf(),
        ..OutputRequest::default()
    };

    let path = backend(false)
        .create_output_from_product(&mut product, &request)
        .unwrap()
        .unwrap();
    let file = netcdf::open(&path).unwrap();

    let y = file.variable("y").unwrap();
    let units = text_attr(y.attribute_value("units").unwrap().unwrap());
    assert_eq!(units, "microradian");
    let expected_scale = 2004.0173154875411 * 1e6 / 35786023.0;
    assert_approx_eq!(f64_attr(&y, "scale_factor"), expected_scale, 1e-9);
    let y_codes: Vec<i16> = y.get_values(..).unwrap();
    assert_eq!(y_codes, vec![3, 2, 1, 0]);

    let projection = file.variable("fixedgrid_projection").unwrap();
    assert_approx_eq!(f64_attr(&projection, "perspective_point_height"), 35786023.0, 1e-6);
    assert!(file.attribute("satellite_longitude").is_some());
}
