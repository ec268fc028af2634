//! Shared test utilities for the scmi-tiler workspace.
//!
//! Provides grid and product fixtures, synthetic data generators and
//! approximate-equality assertions.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, lcc_grid, synthetic_product};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Assert two numbers differ by at most `epsilon`. Operands are compared as `f64`.
///
/// ```
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1000.0_f32 / 65534.0, 0.015259, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `{} ≈ {}`\n  left: {:?}\n right: {:?}\n  diff: {:?} > {:?}",
                stringify!($left),
                stringify!($right),
                left,
                right,
                diff,
                epsilon
            );
        }
    }};
}

/// Assert two (longitude, latitude) pairs are within `epsilon` degrees.
///
/// ```
/// use test_utils::assert_lonlat_approx_eq;
///
/// assert_lonlat_approx_eq!((-75.00001, 0.0), (-75.0, 0.0), 1e-4);
/// ```
#[macro_export]
macro_rules! assert_lonlat_approx_eq {
    (($lon1:expr, $lat1:expr), ($lon2:expr, $lat2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($lon1, $lon2, $epsilon);
        $crate::assert_approx_eq!($lat1, $lat2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_within_epsilon() {
        assert_approx_eq!(65534.0 * (15.0 / 65534.0), 15.0, 1e-9);
        assert_approx_eq!(-4500.0_f32, -4500.0_f64, 0.0);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_outside_epsilon() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_nan_never_matches() {
        assert_approx_eq!(f64::NAN, f64::NAN, 1.0);
    }

    #[test]
    fn test_lonlat() {
        assert_lonlat_approx_eq!((-95.0001, 25.0), (-95.0, 25.0001), 1e-3);
    }
}
