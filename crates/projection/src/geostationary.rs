//! Geostationary (fixed grid) satellite projection.
//!
//! Coordinates in this projection are scan angles in radians measured from
//! the satellite nadir. Grid definitions usually carry them as PROJ-style
//! projection meters, which are the scan angle multiplied by the perspective
//! point height; [`Geostationary::meters_to_scan`] converts between the two.
//!
//! Two sweep conventions exist:
//! - `x` sweep (GOES-R ABI): the east-west angle is the outer gimbal.
//! - `y` sweep (Meteosat, Himawari AHI): the north-south angle is the outer gimbal.
//!
//! # Reference
//!
//! GOES-R Product Definition and Users' Guide (PUG) Volume 4, Section 4.2.8

/// Axis the instrument sweeps around first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAxis {
    X,
    Y,
}

impl SweepAxis {
    /// Parse a PROJ `sweep` value. Anything other than `y` is treated as `x`.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("y") {
            SweepAxis::Y
        } else {
            SweepAxis::X
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SweepAxis::X => "x",
            SweepAxis::Y => "y",
        }
    }
}

/// Geostationary projection parameters.
#[derive(Debug, Clone)]
pub struct Geostationary {
    /// Distance from Earth center to the satellite (meters)
    pub h: f64,
    /// Perspective point height above the ellipsoid (meters)
    pub perspective_point_height: f64,
    /// Semi-major axis of Earth ellipsoid (meters)
    pub req: f64,
    /// Semi-minor axis of Earth ellipsoid (meters)
    pub rpol: f64,
    /// Longitude of satellite nadir point (radians)
    pub lambda_0: f64,
    /// Sweep angle axis
    pub sweep: SweepAxis,
}

impl Geostationary {
    /// Create a projection from PROJ `geos` parameters.
    ///
    /// # Arguments
    /// * `perspective_point_height` - Satellite altitude above the ellipsoid (meters)
    /// * `semi_major_axis` - Earth equatorial radius (meters)
    /// * `semi_minor_axis` - Earth polar radius (meters)
    /// * `longitude_origin_deg` - Sub-satellite longitude (degrees, negative for west)
    /// * `sweep` - Sweep angle axis
    pub fn new(
        perspective_point_height: f64,
        semi_major_axis: f64,
        semi_minor_axis: f64,
        longitude_origin_deg: f64,
        sweep: SweepAxis,
    ) -> Self {
        Self {
            h: perspective_point_height + semi_major_axis,
            perspective_point_height,
            req: semi_major_axis,
            rpol: semi_minor_axis,
            lambda_0: longitude_origin_deg.to_radians(),
            sweep,
        }
    }

    /// GOES-16 (GOES-East at 75.2°W) with the GRS80 ellipsoid.
    pub fn goes16() -> Self {
        Self::new(35786023.0, 6378137.0, 6356752.31414, -75.2, SweepAxis::X)
    }

    /// Himawari-8/9 (140.7°E), which sweeps around the y axis.
    pub fn himawari() -> Self {
        Self::new(35785863.0, 6378137.0, 6356752.3, 140.7, SweepAxis::Y)
    }

    /// Convert a projection coordinate in meters to a scan angle in radians.
    #[inline]
    pub fn meters_to_scan(&self, meters: f64) -> f64 {
        meters / self.perspective_point_height
    }

    /// Line of sight from the satellite for a pair of scan angles, in the
    /// satellite frame (x toward Earth center, y east negative, z north).
    fn line_of_sight(&self, x_rad: f64, y_rad: f64) -> (f64, f64, f64) {
        let (sin_x, cos_x) = x_rad.sin_cos();
        let (sin_y, cos_y) = y_rad.sin_cos();
        match self.sweep {
            SweepAxis::X => (cos_x * cos_y, -sin_x, cos_x * sin_y),
            SweepAxis::Y => (cos_x * cos_y, -sin_x * cos_y, sin_y),
        }
    }

    /// Convert scan angles (radians) to geographic coordinates (lon, lat degrees).
    ///
    /// Returns `None` if the line of sight misses the Earth.
    pub fn scan_to_geo(&self, x_rad: f64, y_rad: f64) -> Option<(f64, f64)> {
        let (dx, dy, dz) = self.line_of_sight(x_rad, y_rad);
        let flattening = (self.req / self.rpol).powi(2);

        // Quadratic for the distance from the satellite to the surface
        let a = dx * dx + dy * dy + flattening * dz * dz;
        let b = -2.0 * self.h * dx;
        let c = self.h * self.h - self.req * self.req;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let rs = (-b - discriminant.sqrt()) / (2.0 * a);

        let sx = rs * dx;
        let sy = rs * dy;
        let sz = rs * dz;

        let lat = (flattening * sz / (self.h - sx).hypot(sy)).atan();
        let lon = self.lambda_0 - sy.atan2(self.h - sx);

        Some((normalize_longitude(lon.to_degrees()), lat.to_degrees()))
    }

    /// Convert geographic coordinates (lon, lat degrees) to scan angles (radians).
    ///
    /// Returns `None` if the point is not visible from the satellite.
    pub fn geo_to_scan(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lat_rad = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lambda_0;
        let flattening = (self.req / self.rpol).powi(2);

        // Geocentric latitude and radius of the surface point
        let phi_c = (lat_rad.tan() / flattening).atan();
        let e2 = 1.0 - (self.rpol / self.req).powi(2);
        let rc = self.rpol / (1.0 - e2 * phi_c.cos().powi(2)).sqrt();

        let sx = self.h - rc * phi_c.cos() * dlon.cos();
        let sy = -rc * phi_c.cos() * dlon.sin();
        let sz = rc * phi_c.sin();

        // Beyond the limb
        if self.h * (self.h - sx) < sy * sy + flattening * sz * sz {
            return None;
        }

        let (x_rad, y_rad) = match self.sweep {
            SweepAxis::X => {
                let norm = (sx * sx + sy * sy + sz * sz).sqrt();
                ((-sy / norm).asin(), sz.atan2(sx))
            }
            SweepAxis::Y => ((-sy).atan2(sx), sz.atan2(sx.hypot(sy))),
        };
        Some((x_rad, y_rad))
    }

    /// Convert projection meters to geographic coordinates (lon, lat degrees).
    pub fn xy_to_geo(&self, x_m: f64, y_m: f64) -> Option<(f64, f64)> {
        self.scan_to_geo(self.meters_to_scan(x_m), self.meters_to_scan(y_m))
    }
}

/// Wrap a longitude into [-180, 180).
pub(crate) fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped.is_finite() {
        wrapped
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nadir_is_subsatellite_point() {
        let proj = Geostationary::goes16();
        let (lon, lat) = proj.scan_to_geo(0.0, 0.0).unwrap();
        assert!((lon - (-75.2)).abs() < 1e-9, "nadir lon {}", lon);
        assert!(lat.abs() < 1e-9, "nadir lat {}", lat);
    }

    #[test]
    fn test_roundtrip_sweep_x() {
        let proj = Geostationary::goes16();
        for &(lon, lat) in &[(-95.0, 35.0), (-75.2, 0.0), (-40.0, -30.0), (-120.0, 50.0)] {
            let (x, y) = proj.geo_to_scan(lon, lat).unwrap();
            let (lon2, lat2) = proj.scan_to_geo(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_roundtrip_sweep_y() {
        let proj = Geostationary::himawari();
        for &(lon, lat) in &[(135.0, 35.0), (150.0, -20.0), (170.0, 10.0)] {
            let (x, y) = proj.geo_to_scan(lon, lat).unwrap();
            let (lon2, lat2) = proj.scan_to_geo(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-6, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-6, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_sweeps_agree_on_axes() {
        // Along either axis alone both conventions describe the same ray.
        let x_sweep = Geostationary::goes16();
        let mut y_sweep = Geostationary::goes16();
        y_sweep.sweep = SweepAxis::Y;

        let a = x_sweep.scan_to_geo(0.05, 0.0).unwrap();
        let b = y_sweep.scan_to_geo(0.05, 0.0).unwrap();
        assert!((a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9);

        let c = x_sweep.scan_to_geo(0.05, 0.05).unwrap();
        let d = y_sweep.scan_to_geo(0.05, 0.05).unwrap();
        assert!((c.0 - d.0).abs() > 1e-6 || (c.1 - d.1).abs() > 1e-6);
    }

    #[test]
    fn test_space_pixel() {
        let proj = Geostationary::goes16();
        assert!(proj.scan_to_geo(0.5, 0.5).is_none());
    }

    #[test]
    fn test_not_visible() {
        let proj = Geostationary::goes16();
        assert!(proj.geo_to_scan(105.0, 0.0).is_none());
    }

    #[test]
    fn test_meters_to_scan() {
        let proj = Geostationary::goes16();
        let x = proj.meters_to_scan(35786023.0 * 0.01);
        assert!((x - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_sweep_parse() {
        assert_eq!(SweepAxis::parse("y"), SweepAxis::Y);
        assert_eq!(SweepAxis::parse("x"), SweepAxis::X);
        assert_eq!(SweepAxis::parse(""), SweepAxis::X);
        assert_eq!(SweepAxis::Y.as_str(), "y");
    }
}
