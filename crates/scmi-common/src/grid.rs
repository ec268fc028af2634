//! Grid definitions for projected satellite and model rasters.

use projection::{Geostationary, LambertConformal, SweepAxis};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// Projection family of a grid, derived from the PROJ `proj` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjFamily {
    /// `geos`: geostationary fixed grid
    Geostationary,
    /// `lcc`: Lambert Conformal Conic
    LambertConformal,
    /// `latlong` / `longlat`: plate carrée in degrees
    LatLon,
    /// Anything else. Carried through but not described in output files.
    Other(String),
}

impl ProjFamily {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "geos" => ProjFamily::Geostationary,
            "lcc" => ProjFamily::LambertConformal,
            "latlong" | "longlat" | "latlon" | "lonlat" => ProjFamily::LatLon,
            other => ProjFamily::Other(other.to_string()),
        }
    }
}

/// PROJ-style projection parameters.
///
/// For `geos` grids the semi-axes `a`/`b` are kilometers and `h` is meters.
/// For `lcc` grids `a`/`b` are meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjParams {
    pub proj: String,
    pub a: f64,
    #[serde(default)]
    pub b: Option<f64>,
    #[serde(default)]
    pub h: Option<f64>,
    #[serde(default)]
    pub lon_0: f64,
    #[serde(default)]
    pub lat_0: Option<f64>,
    #[serde(default)]
    pub lat_1: Option<f64>,
    #[serde(default)]
    pub lat_2: Option<f64>,
    #[serde(default)]
    pub sweep: Option<String>,
    /// False easting (meters)
    #[serde(default)]
    pub x_0: Option<f64>,
    /// False northing (meters)
    #[serde(default)]
    pub y_0: Option<f64>,
}

impl ProjParams {
    pub fn family(&self) -> ProjFamily {
        ProjFamily::from_tag(&self.proj)
    }

    /// Semi-minor axis, falling back to `a` for spheres.
    pub fn semi_minor(&self) -> f64 {
        self.b.unwrap_or(self.a)
    }
}

/// A projected, rectilinear grid.
///
/// Pixel `(row, col)` covers the cell whose upper-left corner is
/// `(origin_x + col * cell_width, origin_y - row * cell_height)` in
/// projection coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDefinition {
    pub grid_name: String,
    /// Number of rows
    pub height: usize,
    /// Number of columns
    pub width: usize,
    /// Cell width in projection units (meters)
    pub cell_width: f64,
    /// Cell height in projection units (meters), positive
    pub cell_height: f64,
    /// Projection X of the upper-left corner of the grid
    pub origin_x: f64,
    /// Projection Y of the upper-left corner of the grid
    pub origin_y: f64,
    pub proj: ProjParams,
}

/// Point lookup for a grid's projection.
#[derive(Debug, Clone)]
enum Projector {
    Geos(Geostationary),
    Lcc(LambertConformal),
    LatLon,
}

impl GridDefinition {
    /// Check the grid is usable for tiling and point lookups.
    pub fn validate(&self) -> CommonResult<()> {
        if self.height == 0 || self.width == 0 {
            return Err(CommonError::invalid_grid(&self.grid_name, "empty grid shape"));
        }
        if !(self.cell_width > 0.0 && self.cell_height > 0.0) {
            return Err(CommonError::invalid_grid(
                &self.grid_name,
                format!(
                    "cell size must be positive, got {} x {}",
                    self.cell_width, self.cell_height
                ),
            ));
        }
        if self.proj.family() == ProjFamily::Geostationary
            && !self.proj.h.map_or(false, |h| h > 0.0)
        {
            return Err(CommonError::invalid_grid(
                &self.grid_name,
                "geostationary grid requires a positive 'h'",
            ));
        }
        Ok(())
    }

    pub fn family(&self) -> ProjFamily {
        self.proj.family()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Pixel-center X coordinates for `cols` columns starting at the grid origin.
    ///
    /// `cols` may exceed the grid width; the axis continues at the same spacing.
    pub fn x_axis(&self, cols: usize) -> Vec<f64> {
        (0..cols)
            .map(|i| self.origin_x + (i as f64 + 0.5) * self.cell_width)
            .collect()
    }

    /// Pixel-center Y coordinates for `rows` rows, decreasing from the origin.
    pub fn y_axis(&self, rows: usize) -> Vec<f64> {
        (0..rows)
            .map(|j| self.origin_y - (j as f64 + 0.5) * self.cell_height)
            .collect()
    }

    fn projector(&self) -> Option<Projector> {
        let p = &self.proj;
        match p.family() {
            ProjFamily::Geostationary => {
                let h = p.h?;
                let sweep = p.sweep.as_deref().map_or(SweepAxis::X, SweepAxis::parse);
                Some(Projector::Geos(Geostationary::new(
                    h,
                    p.a * 1000.0,
                    p.semi_minor() * 1000.0,
                    p.lon_0,
                    sweep,
                )))
            }
            ProjFamily::LambertConformal => {
                let lat_0 = p.lat_0.or(p.lat_1)?;
                let lat_1 = p.lat_1.unwrap_or(lat_0);
                let lat_2 = p.lat_2.unwrap_or(lat_1);
                Some(Projector::Lcc(
                    LambertConformal::new(lat_0, p.lon_0, lat_1, lat_2, p.a)
                        .with_false_origin(p.x_0.unwrap_or(0.0), p.y_0.unwrap_or(0.0)),
                ))
            }
            ProjFamily::LatLon => Some(Projector::LatLon),
            ProjFamily::Other(_) => None,
        }
    }

    /// Geodetic (lon, lat) in degrees at the center of pixel `(row, col)`.
    ///
    /// Returns `None` for unsupported projections or pixels that do not
    /// intersect the Earth (geostationary space pixels).
    pub fn lonlat(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        let x = self.origin_x + (col as f64 + 0.5) * self.cell_width;
        let y = self.origin_y - (row as f64 + 0.5) * self.cell_height;
        match self.projector()? {
            Projector::Geos(geos) => geos.xy_to_geo(x, y),
            Projector::Lcc(lcc) => Some(lcc.xy_to_geo(x, y)),
            Projector::LatLon => Some((x, y)),
        }
    }

    /// Geodetic (lon, lat) of the scene center pixel.
    pub fn center_lonlat(&self) -> Option<(f64, f64)> {
        self.lonlat(self.height / 2, self.width / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goes_conus() -> GridDefinition {
        GridDefinition {
            grid_name: "goes_east_conus".to_string(),
            height: 1500,
            width: 2500,
            cell_width: 2004.0173154875411,
            cell_height: 2004.0173154875411,
            origin_x: -3627271.2913,
            origin_y: 4589199.5884,
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

    #[test]
    fn test_axes_are_pixel_centers() {
        let grid = goes_conus();
        let x = grid.x_axis(3);
        let y = grid.y_axis(3);
        assert!((x[0] - (grid.origin_x + 0.5 * grid.cell_width)).abs() < 1e-6);
        assert!((x[2] - x[1] - grid.cell_width).abs() < 1e-6);
        assert!((y[1] - y[0] + grid.cell_height).abs() < 1e-6);
    }

    #[test]
    fn test_geos_center_is_over_conus() {
        let grid = goes_conus();
        let (lon, lat) = grid.center_lonlat().unwrap();
        assert!(lon > -110.0 && lon < -80.0, "lon {}", lon);
        assert!(lat > 25.0 && lat < 45.0, "lat {}", lat);
    }

    #[test]
    fn test_lcc_origin_lookup() {
        let grid = GridDefinition {
            grid_name: "lcc_test".to_string(),
            height: 2,
            width: 2,
            cell_width: 3000.0,
            cell_height: 3000.0,
            origin_x: -3000.0,
            origin_y: 3000.0,
            proj: ProjParams {
                proj: "lcc".to_string(),
                a: 6371229.0,
                b: None,
                h: None,
                lon_0: -97.5,
                lat_0: Some(38.5),
                lat_1: Some(38.5),
                lat_2: None,
                sweep: None,
                x_0: None,
                y_0: None,
            },
        };
        // The corner shared by all four pixels is the projection origin.
        let (lon, lat) = grid.lonlat(0, 1).unwrap();
        assert!(lon > -97.5 && lon < -97.4, "lon {}", lon);
        assert!(lat > 38.5 && lat < 38.55, "lat {}", lat);
    }

    #[test]
    fn test_unsupported_family_has_no_lookup() {
        let mut grid = goes_conus();
        grid.proj.proj = "stere".to_string();
        assert_eq!(grid.family(), ProjFamily::Other("stere".to_string()));
        assert!(grid.lonlat(0, 0).is_none());
    }

    #[test]
    fn test_validate() {
        let mut grid = goes_conus();
        assert!(grid.validate().is_ok());
        grid.proj.h = None;
        assert!(grid.validate().is_err());
        grid.proj.h = Some(35786023.0);
        grid.width = 0;
        assert!(grid.validate().is_err());
    }

    #[test]
    fn test_proj_params_from_json() {
        let params: ProjParams =
            serde_json::from_str(r#"{"proj": "geos", "a": 6378.137, "h": 35786023.0, "lon_0": -137.0}"#)
                .unwrap();
        assert_eq!(params.family(), ProjFamily::Geostationary);
        assert_eq!(params.semi_minor(), 6378.137);
        assert!(params.sweep.is_none());
    }
}
