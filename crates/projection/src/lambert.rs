//! Lambert Conformal Conic projection (spherical form).
//!
//! Maps a cone tangent or secant to the Earth's surface onto a flat plane.
//! Projection coordinates are meters relative to the projection origin
//! (`lat_0`, `lon_0`) plus any false easting/northing.
//!
//! The projection parameters include:
//! - Origin latitude (lat_0) and central meridian (lon_0)
//! - Standard parallel(s): lat_1 and lat_2 (equal for a tangent cone)
//! - Sphere radius in meters
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual", pp. 104-110.

use std::f64::consts::FRAC_PI_4;

use crate::geostationary::normalize_longitude;

/// Lambert Conformal Conic projection parameters.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of the projection origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub lat1: f64,
    /// Second standard parallel in radians
    pub lat2: f64,
    /// Sphere radius (meters)
    pub radius: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the origin latitude
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from PROJ `lcc` parameters.
    ///
    /// # Arguments
    /// * `lat_0` - Latitude of origin (degrees)
    /// * `lon_0` - Central meridian (degrees)
    /// * `lat_1` - First standard parallel (degrees)
    /// * `lat_2` - Second standard parallel (degrees)
    /// * `radius` - Sphere radius (meters)
    pub fn new(lat_0: f64, lon_0: f64, lat_1: f64, lat_2: f64, radius: f64) -> Self {
        let lat0 = lat_0.to_radians();
        let lat1 = lat_1.to_radians();
        let lat2 = lat_2.to_radians();

        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Tangent cone
            lat1.sin()
        } else {
            let ln_ratio = (lat1.cos() / lat2.cos()).ln();
            let tan_ratio =
                ((FRAC_PI_4 + lat2 / 2.0).tan() / (FRAC_PI_4 + lat1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        let f = lat1.cos() * (FRAC_PI_4 + lat1 / 2.0).tan().powf(n) / n;
        let rho0 = radius * f / (FRAC_PI_4 + lat0 / 2.0).tan().powf(n);

        Self {
            lon0: lon_0.to_radians(),
            lat0,
            lat1,
            lat2,
            radius,
            false_easting: 0.0,
            false_northing: 0.0,
            n,
            f,
            rho0,
        }
    }

    /// Set false easting/northing (meters).
    pub fn with_false_origin(mut self, false_easting: f64, false_northing: f64) -> Self {
        self.false_easting = false_easting;
        self.false_northing = false_northing;
        self
    }

    /// HRRR CONUS grid projection (tangent at 38.5°N, central meridian 97.5°W).
    pub fn hrrr() -> Self {
        Self::new(38.5, -97.5, 38.5, 38.5, 6371229.0)
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    fn rho(&self, lat_rad: f64) -> f64 {
        self.radius * self.f / (FRAC_PI_4 + lat_rad / 2.0).tan().powf(self.n)
    }

    /// Convert geographic coordinates (lon, lat degrees) to projection meters.
    pub fn geo_to_xy(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let rho = self.rho(lat_deg.to_radians());

        let mut dlon = lon_deg.to_radians() - self.lon0;
        if dlon > std::f64::consts::PI {
            dlon -= 2.0 * std::f64::consts::PI;
        } else if dlon < -std::f64::consts::PI {
            dlon += 2.0 * std::f64::consts::PI;
        }
        let theta = self.n * dlon;

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x, y)
    }

    /// Convert projection meters to geographic coordinates (lon, lat degrees).
    pub fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);

        let sign = self.n.signum();
        let rho = sign * x.hypot(dy);
        let theta = (sign * x).atan2(sign * dy);

        let lat = if rho == 0.0 {
            sign * std::f64::consts::FRAC_PI_2
        } else {
            2.0 * (self.radius * self.f / rho).powf(1.0 / self.n).atan()
                - std::f64::consts::FRAC_PI_2
        };
        let lon = self.lon0 + theta / self.n;

        (normalize_longitude(lon.to_degrees()), lat.to_degrees())
    }
}
