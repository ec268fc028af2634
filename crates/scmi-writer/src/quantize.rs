//! Fixed-point encoding of float samples.
//!
//! A float range `[valid_min, valid_max]` is mapped linearly onto integer
//! codes so that `physical = code * scale_factor + add_offset`. When the
//! requested bit depth uses the whole storage type, the top code is reserved
//! as the fill value.

use crate::error::{Result, ScmiError};

/// AWIPS readers reject negative codes, so signed storage donates its sign bit.
pub const AWIPS_USES_NEGATIVES: bool = false;

/// Encoding parameters shared by every tile of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizationParams {
    pub scale_factor: f64,
    pub add_offset: f64,
    /// Code reserved for "no data", in the effective storage width.
    pub fill_code: i64,
    /// Bit depth actually used for data codes.
    pub bit_depth: u32,
    /// Number of codes reserved at the top of the data range (0 or 1).
    pub reserved_fills: u32,
    /// Codes are centered on zero.
    pub signed: bool,
    pub valid_min: f64,
    pub valid_max: f64,
}

impl QuantizationParams {
    /// Smallest data code.
    pub fn code_min(&self) -> i64 {
        if self.signed {
            -(1i64 << (self.bit_depth - 1))
        } else {
            0
        }
    }

    /// Largest data code.
    pub fn code_max(&self) -> i64 {
        let reserved = self.reserved_fills as i64;
        if self.signed {
            (1i64 << (self.bit_depth - 1)) - 1 - reserved
        } else {
            (1i64 << self.bit_depth) - 1 - reserved
        }
    }

    /// Encode one sample. Masked and non-finite samples become the fill code.
    #[inline]
    pub fn encode(&self, value: f32, masked: bool) -> i64 {
        if masked || !value.is_finite() {
            return self.fill_code;
        }
        let code = ((value as f64 - self.add_offset) / self.scale_factor).round();
        (code as i64).clamp(self.code_min(), self.code_max())
    }

    #[inline]
    pub fn decode(&self, code: i64) -> f64 {
        code as f64 * self.scale_factor + self.add_offset
    }
}

/// Quantizer for a particular storage type.
#[derive(Debug, Clone, Copy)]
pub struct Quantizer {
    pub storage_width_bits: u32,
    pub storage_is_unsigned: bool,
    pub allow_negative: bool,
    /// Fill codes to reserve when the data uses the full storage width.
    pub num_fills: u32,
}

impl Quantizer {
    pub fn new(storage_width_bits: u32, storage_is_unsigned: bool) -> Self {
        Self {
            storage_width_bits,
            storage_is_unsigned,
            allow_negative: AWIPS_USES_NEGATIVES,
            num_fills: 1,
        }
    }

    /// Quantizer for the `u16` pixel variable of an SCMI tile.
    pub fn pixel() -> Self {
        Self::new(16, true)
    }

    pub fn with_fills(mut self, num_fills: u32) -> Self {
        self.num_fills = num_fills;
        self
    }

    /// Compute scale, offset and fill code for a valid range.
    pub fn calc_factor_offset(
        &self,
        valid_min: f64,
        valid_max: f64,
        bit_depth: u32,
    ) -> Result<QuantizationParams> {
        if self.num_fills > 1 {
            return Err(ScmiError::config(
                "more than one reserved fill code is not supported",
            ));
        }
        if bit_depth == 0 {
            return Err(ScmiError::config("bit depth must be at least 1"));
        }
        if self.storage_width_bits < 2 || self.storage_width_bits > 32 {
            return Err(ScmiError::config(format!(
                "unsupported storage width of {} bits",
                self.storage_width_bits
            )));
        }
        if !(valid_min.is_finite() && valid_max.is_finite()) || valid_min > valid_max {
            return Err(ScmiError::config(format!(
                "invalid valid range [{}, {}]",
                valid_min, valid_max
            )));
        }

        let mut effective_bits = self.storage_width_bits;
        let mut signed = !self.storage_is_unsigned;
        if !self.allow_negative && signed {
            effective_bits -= 1;
            signed = false;
        }

        let (bit_depth, reserved_fills) = if bit_depth >= effective_bits {
            (effective_bits, self.num_fills)
        } else {
            // The unused high range of the storage type holds the fill value
            (bit_depth, 0)
        };

        let levels = (1u64 << bit_depth) as f64 - 1.0 - reserved_fills as f64;
        let scale_factor = if valid_max > valid_min && levels > 0.0 {
            (valid_max - valid_min) / levels
        } else {
            1.0
        };

        let mut add_offset = valid_min;
        if signed {
            add_offset += (1u64 << (bit_depth - 1)) as f64 * scale_factor;
        }

        let fill_code = if signed {
            (1i64 << (effective_bits - 1)) - 1
        } else {
            (1i64 << effective_bits) - 1
        };

        Ok(QuantizationParams {
            scale_factor,
            add_offset,
            fill_code,
            bit_depth,
            reserved_fills,
            signed,
            valid_min,
            valid_max,
        })
    }
}

/// Compute encoding parameters for a storage type, reserving one fill code.
pub fn calc_factor_offset(
    valid_min: f64,
    valid_max: f64,
    bit_depth: u32,
    storage_width_bits: u32,
    storage_is_unsigned: bool,
) -> Result<QuantizationParams> {
    Quantizer::new(storage_width_bits, storage_is_unsigned).calc_factor_offset(
        valid_min,
        valid_max,
        bit_depth,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_depth_uses_no_reserved_fill() {
        let q = calc_factor_offset(0.0, 255.0, 8, 16, true).unwrap();
        assert_eq!(q.reserved_fills, 0);
        assert_eq!(q.bit_depth, 8);
        assert_eq!(q.scale_factor, 1.0);
        assert_eq!(q.add_offset, 0.0);
        assert_eq!(q.fill_code, 65535);
        assert_eq!((q.code_min(), q.code_max()), (0, 255));
    }

    #[test]
    fn test_full_depth_reserves_top_code() {
        let q = calc_factor_offset(0.0, 1000.0, 16, 16, true).unwrap();
        assert_eq!(q.reserved_fills, 1);
        assert_eq!(q.scale_factor, 1000.0 / 65534.0);
        assert_eq!(q.add_offset, 0.0);
        assert_eq!(q.fill_code, 65535);
        assert_eq!(q.code_max(), 65534);
        assert_eq!(q.encode(1000.0, false), 65534);
    }

    #[test]
    fn test_requested_depth_is_capped() {
        let q = calc_factor_offset(0.0, 1.0, 24, 16, true).unwrap();
        assert_eq!(q.bit_depth, 16);
        assert_eq!(q.reserved_fills, 1);
    }

    #[test]
    fn test_signed_storage_donates_sign_bit() {
        let q = calc_factor_offset(-10.0, 10.0, 16, 16, false).unwrap();
        assert!(!q.signed);
        assert_eq!(q.bit_depth, 15);
        assert_eq!(q.fill_code, 32767);
        assert_eq!(q.add_offset, -10.0);
        assert_eq!(q.code_max(), 32766);
    }

    #[test]
    fn test_signed_codes_recenter_offset() {
        let mut quantizer = Quantizer::new(16, false);
        quantizer.allow_negative = true;
        let q = quantizer.calc_factor_offset(0.0, 65534.0, 16).unwrap();
        assert!(q.signed);
        assert_eq!(q.scale_factor, 1.0);
        assert_eq!(q.add_offset, 32768.0);
        assert_eq!(q.fill_code, 32767);
        assert_eq!((q.code_min(), q.code_max()), (-32768, 32766));
        assert_eq!(q.encode(0.0, false), -32768);
    }

    #[test]
    fn test_multiple_fills_rejected() {
        let err = Quantizer::pixel()
            .with_fills(2)
            .calc_factor_offset(0.0, 1.0, 16)
            .unwrap_err();
        assert!(matches!(err, ScmiError::Configuration(_)));
    }

    #[test]
    fn test_degenerate_range() {
        let q = calc_factor_offset(5.0, 5.0, 16, 16, true).unwrap();
        assert_eq!(q.scale_factor, 1.0);
        assert_eq!(q.encode(5.0, false), 0);
    }

    #[test]
    fn test_masked_and_nan_become_fill() {
        let q = calc_factor_offset(0.0, 1.0, 12, 16, true).unwrap();
        assert_eq!(q.encode(0.5, true), q.fill_code);
        assert_eq!(q.encode(f32::NAN, false), q.fill_code);
        assert_eq!(q.encode(2.0, false), q.code_max(), "out of range values clamp");
    }

    #[test]
    fn test_roundtrip_within_one_step() {
        let ranges = [(0.0, 1.0), (-50.0, 50.0), (180.0, 330.0), (0.0, 1e-3)];
        for bit_depth in 1..=16u32 {
            for &(lo, hi) in &ranges {
                let q = calc_factor_offset(lo, hi, bit_depth, 16, true).unwrap();
                for i in 0..=64 {
                    let v = lo + (hi - lo) * i as f64 / 64.0;
                    let code = q.encode(v as f32, false);
                    assert_ne!(code, q.fill_code, "bit_depth={} v={}", bit_depth, v);
                    let back = q.decode(code);
                    assert!(
                        (back - v).abs() <= q.scale_factor * 1.0001,
                        "bit_depth={} v={} back={} scale={}",
                        bit_depth,
                        v,
                        back,
                        q.scale_factor
                    );
                }
            }
        }
    }
}
