//! Synthetic products with predictable values.

use scmi_common::{GridDefinition, GriddedProduct};

use crate::fixtures::product_info;

/// Product `ch13` on `grid` with `value(row, col)` at every pixel.
///
/// NaN values are masked.
///
/// # Example
///
/// ```
/// use test_utils::{lcc_grid, synthetic_product};
///
/// let product = synthetic_product(lcc_grid(2, 3), |r, c| (r * 10 + c) as f32);
/// assert_eq!(product.data(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
/// ```
pub fn synthetic_product<F>(grid: GridDefinition, value: F) -> GriddedProduct
where
    F: Fn(usize, usize) -> f32,
{
    let (rows, cols) = grid.shape();
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            data.push(value(row, col));
        }
    }
    GriddedProduct::from_data(product_info("ch13"), grid, data)
        .unwrap_or_else(|e| panic!("invalid synthetic product: {}", e))
}

/// Brightness-temperature-like gradient from 200 K (top-left) to 300 K
/// (bottom-right).
pub fn temperature_product(grid: GridDefinition) -> GriddedProduct {
    let (rows, cols) = grid.shape();
    let span = (rows + cols).saturating_sub(2).max(1) as f32;
    synthetic_product(grid, |r, c| 200.0 + 100.0 * (r + c) as f32 / span)
}

/// Like [`synthetic_product`], with pixels where `masked(row, col)` holds set to NaN.
pub fn masked_product<F, M>(grid: GridDefinition, value: F, masked: M) -> GriddedProduct
where
    F: Fn(usize, usize) -> f32,
    M: Fn(usize, usize) -> bool,
{
    synthetic_product(grid, |r, c| if masked(r, c) { f32::NAN } else { value(r, c) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::lcc_grid;

    #[test]
    fn test_temperature_range() {
        let product = temperature_product(lcc_grid(5, 5));
        assert_eq!(product.data_range(), Some((200.0, 300.0)));
    }

    #[test]
    fn test_masked_product() {
        let product = masked_product(lcc_grid(2, 2), |_, _| 1.0, |r, _| r == 0);
        assert_eq!(product.mask(), &[true, true, false, false]);
        assert_eq!(product.data_range(), Some((1.0, 1.0)));
    }
}
