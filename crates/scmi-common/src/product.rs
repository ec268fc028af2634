//! Gridded products: one raster plus its metadata and validity mask.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};
use crate::grid::GridDefinition;

/// Descriptive metadata for a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_name: String,
    pub satellite: String,
    pub instrument: String,
    /// Kind of quantity, e.g. `reflectance`, `brightness_temperature`
    pub data_kind: String,
    #[serde(default)]
    pub standard_name: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    pub begin_time: DateTime<Utc>,
    /// Requested encoding depth in bits. Defaults to 16.
    #[serde(default)]
    pub bit_depth: Option<u32>,
    #[serde(default)]
    pub valid_min: Option<f64>,
    #[serde(default)]
    pub valid_max: Option<f64>,
}

impl ProductInfo {
    pub const DEFAULT_BIT_DEPTH: u32 = 16;

    pub fn bit_depth(&self) -> u32 {
        self.bit_depth.unwrap_or(Self::DEFAULT_BIT_DEPTH)
    }
}

/// A product's samples in row-major order with a parallel invalidity mask.
#[derive(Debug, Clone)]
pub struct GriddedProduct {
    pub info: ProductInfo,
    pub grid: GridDefinition,
    data: Vec<f32>,
    /// `true` marks an invalid sample
    mask: Vec<bool>,
}

impl GriddedProduct {
    /// Build a product. `data` and `mask` must both hold `height * width` samples.
    pub fn new(
        info: ProductInfo,
        grid: GridDefinition,
        data: Vec<f32>,
        mask: Vec<bool>,
    ) -> CommonResult<Self> {
        grid.validate()?;
        let expected = grid.height * grid.width;
        if data.len() != expected {
            return Err(CommonError::ShapeMismatch {
                what: "data",
                expected,
                actual: data.len(),
            });
        }
        if mask.len() != expected {
            return Err(CommonError::ShapeMismatch {
                what: "mask",
                expected,
                actual: mask.len(),
            });
        }
        Ok(Self {
            info,
            grid,
            data,
            mask,
        })
    }

    /// Build a product whose mask is derived from the data: NaN samples are invalid.
    pub fn from_data(info: ProductInfo, grid: GridDefinition, data: Vec<f32>) -> CommonResult<Self> {
        let mask = data.iter().map(|v| v.is_nan()).collect();
        Self::new(info, grid, data, mask)
    }

    pub fn name(&self) -> &str {
        &self.info.product_name
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Minimum and maximum over valid, finite samples.
    pub fn data_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .zip(&self.mask)
            .filter(|(v, masked)| !**masked && v.is_finite())
            .fold(None, |acc, (&v, _)| {
                let v = v as f64;
                Some(match acc {
                    None => (v, v),
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                })
            })
    }

    /// Record the resolved valid range on the product metadata.
    pub fn set_valid_range(&mut self, valid_min: f64, valid_max: f64) {
        self.info.valid_min = Some(valid_min);
        self.info.valid_max = Some(valid_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ProjParams;
    use chrono::TimeZone;

    fn info() -> ProductInfo {
        ProductInfo {
            product_name: "ch13".to_string(),
            satellite: "goes16".to_string(),
            instrument: "abi".to_string(),
            data_kind: "brightness_temperature".to_string(),
            standard_name: None,
            units: Some("K".to_string()),
            channel_id: Some("13".to_string()),
            begin_time: Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap(),
            bit_depth: None,
            valid_min: None,
            valid_max: None,
        }
    }

    fn grid(height: usize, width: usize) -> GridDefinition {
        GridDefinition {
            grid_name: "test".to_string(),
            height,
            width,
            cell_width: 1.0,
            cell_height: 1.0,
            origin_x: -10.0,
            origin_y: 10.0,
            proj: ProjParams {
                proj: "latlong".to_string(),
                a: 6378137.0,
                b: None,
                h: None,
                lon_0: 0.0,
                lat_0: None,
                lat_1: None,
                lat_2: None,
                sweep: None,
                x_0: None,
                y_0: None,
            },
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let err = GriddedProduct::new(info(), grid(2, 2), vec![0.0; 4], vec![false; 3]).unwrap_err();
        assert!(matches!(err, CommonError::ShapeMismatch { what: "mask", expected: 4, actual: 3 }));
    }

    #[test]
    fn test_data_range_ignores_masked() {
        let product = GriddedProduct::new(
            info(),
            grid(2, 2),
            vec![200.0, 1000.0, 250.0, f32::INFINITY],
            vec![false, true, false, false],
        )
        .unwrap();
        assert_eq!(product.data_range(), Some((200.0, 250.0)));
    }

    #[test]
    fn test_all_masked_has_no_range() {
        let product =
            GriddedProduct::from_data(info(), grid(1, 2), vec![f32::NAN, f32::NAN]).unwrap();
        assert!(product.mask().iter().all(|&m| m));
        assert_eq!(product.data_range(), None);
    }

    #[test]
    fn test_set_valid_range() {
        let mut product = GriddedProduct::from_data(info(), grid(1, 1), vec![1.0]).unwrap();
        product.set_valid_range(0.0, 5.0);
        assert_eq!(product.info.valid_min, Some(0.0));
        assert_eq!(product.info.valid_max, Some(5.0));
        assert_eq!(product.info.bit_depth(), 16);
    }
}
