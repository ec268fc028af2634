//! Grid-mapping variables for supported projections.

use scmi_common::{GridDefinition, ProjFamily};

use crate::attributes::AttributeValue;
use crate::error::{Result, ScmiError};

/// A grid-mapping variable and its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionAttributes {
    /// Name of the scalar variable carrying the attributes
    pub variable_name: &'static str,
    pub attributes: Vec<(&'static str, AttributeValue)>,
}

/// Units and scaling of the x/y coordinate variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateScaling {
    pub units: &'static str,
    /// Multiplier from projection coordinates to stored coordinate units
    pub factor: f64,
}

impl CoordinateScaling {
    pub fn for_grid(grid: &GridDefinition) -> Self {
        match (grid.family(), grid.proj.h) {
            // Projection meters are scan angle times h
            (ProjFamily::Geostationary, Some(h)) if h > 0.0 => Self {
                units: "microradian",
                factor: 1e6 / h,
            },
            _ => Self {
                units: "meters",
                factor: 1.0,
            },
        }
    }
}

/// Derive the grid-mapping variable for a grid.
///
/// Returns `Ok(None)` for projection families SCMI has no mapping for; tiles
/// of such grids are written without a grid-mapping variable.
pub fn derive_projection_attributes(grid: &GridDefinition) -> Result<Option<ProjectionAttributes>> {
    let p = &grid.proj;
    match grid.family() {
        ProjFamily::Geostationary => {
            let h = p.h.ok_or_else(|| {
                ScmiError::config(format!("geostationary grid '{}' has no 'h'", grid.grid_name))
            })?;
            let sweep = p.sweep.clone().unwrap_or_else(|| "x".to_string());
            Ok(Some(ProjectionAttributes {
                variable_name: "fixedgrid_projection",
                attributes: vec![
                    ("short_name", grid.grid_name.clone().into()),
                    ("grid_mapping_name", "geostationary".into()),
                    ("sweep_angle_axis", sweep.into()),
                    // Kilometers in the grid definition
                    ("semi_major", (p.a * 1e3).into()),
                    ("semi_minor", (p.semi_minor() * 1e3).into()),
                    ("perspective_point_height", h.into()),
                    ("latitude_of_projection_origin", AttributeValue::Float(0.0)),
                    ("longitude_of_projection_origin", AttributeValue::Float(p.lon_0 as f32)),
                ],
            }))
        }
        ProjFamily::LambertConformal => {
            let lat_0 = p.lat_0.or(p.lat_1).ok_or_else(|| {
                ScmiError::config(format!("lcc grid '{}' has no lat_0", grid.grid_name))
            })?;
            let lat_1 = p.lat_1.unwrap_or(lat_0);
            if lat_0 != lat_1 || p.lat_2.map_or(false, |lat_2| lat_2 != lat_1) {
                return Err(ScmiError::config(format!(
                    "lcc grid '{}' has two standard parallels, which SCMI output does not support",
                    grid.grid_name
                )));
            }
            Ok(Some(ProjectionAttributes {
                variable_name: "lambert_projection",
                attributes: vec![
                    ("short_name", grid.grid_name.clone().into()),
                    ("grid_mapping_name", "lambert_conformal_conic".into()),
                    ("standard_parallel", lat_0.into()),
                    ("longitude_of_central_meridian", p.lon_0.into()),
                    ("latitude_of_projection_origin", lat_0.into()),
                    ("false_easting", p.x_0.unwrap_or(0.0).into()),
                    ("false_northing", p.y_0.unwrap_or(0.0).into()),
                    ("semi_major", p.a.into()),
                    ("semi_minor", p.semi_minor().into()),
                ],
            }))
        }
        ProjFamily::LatLon | ProjFamily::Other(_) => Ok(None),
    }
}
