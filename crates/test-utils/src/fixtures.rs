//! Common fixtures: product metadata and grid definitions.

use chrono::{TimeZone, Utc};
use scmi_common::{GridDefinition, ProductInfo, ProjParams};

/// Begin time shared by fixture products: 2024-05-01T18:00:00Z.
pub fn fixture_begin_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0)
        .single()
        .unwrap_or_default()
}

/// GOES-16 ABI brightness temperature product metadata.
pub fn product_info(product_name: &str) -> ProductInfo {
    ProductInfo {
        product_name: product_name.to_string(),
        satellite: "goes16".to_string(),
        instrument: "abi".to_string(),
        data_kind: "brightness_temperature".to_string(),
        standard_name: None,
        units: Some("K".to_string()),
        channel_id: None,
        begin_time: fixture_begin_time(),
        bit_depth: None,
        valid_min: None,
        valid_max: None,
    }
}

/// Tangent Lambert conformal grid with 3 km cells centered on the projection origin.
pub fn lcc_grid(rows: usize, cols: usize) -> GridDefinition {
    let cell = 3000.0;
    GridDefinition {
        grid_name: "lcc_test".to_string(),
        height: rows,
        width: cols,
        cell_width: cell,
        cell_height: cell,
        origin_x: -(cols as f64) * cell / 2.0,
        origin_y: rows as f64 * cell / 2.0,
        proj: ProjParams {
            proj: "lcc".to_string(),
            a: 6371229.0,
            b: None,
            h: None,
            lon_0: -95.0,
            lat_0: Some(25.0),
            lat_1: Some(25.0),
            lat_2: None,
            sweep: None,
            x_0: None,
            y_0: None,
        },
    }
}

/// GOES-East fixed grid with 2 km cells centered on the sub-satellite point.
///
/// Axis lengths are in kilometers, heights in meters.
pub fn goes_grid(rows: usize, cols: usize) -> GridDefinition {
    let cell = 2004.0173154875411;
    GridDefinition {
        grid_name: "goes_east_test".to_string(),
        height: rows,
        width: cols,
        cell_width: cell,
        cell_height: cell,
        origin_x: -(cols as f64) * cell / 2.0,
        origin_y: rows as f64 * cell / 2.0,
        proj: ProjParams {
            proj: "geos".to_string(),
            a: 6378.137,
            b: Some(6356.7523),
            h: Some(35786023.0),
            lon_0: -75.0,
            lat_0: None,
            lat_1: None,
            lat_2: None,
            sweep: Some("x".to_string()),
            x_0: None,
            y_0: None,
        },
    }
}

/// Plain lat/lon grid, a family SCMI has no grid mapping for.
pub fn latlon_grid(rows: usize, cols: usize) -> GridDefinition {
    let mut grid = lcc_grid(rows, cols);
    grid.grid_name = "latlon_test".to_string();
    grid.cell_width = 0.1;
    grid.cell_height = 0.1;
    grid.origin_x = -100.0;
    grid.origin_y = 40.0;
    grid.proj.proj = "latlong".to_string();
    grid.proj.lat_0 = None;
    grid.proj.lat_1 = None;
    grid
}
