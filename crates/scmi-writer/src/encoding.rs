//! Product encoding table: naming and unit metadata per product.
//!
//! ```yaml
//! products:
//!   - satellite: "*"
//!     instrument: abi
//!     product_name: ch13
//!     source_name: SSEC
//!     units: K
//!     standard_name: toa_brightness_temperature
//! ```
//!
//! Entries are matched in order; `*` matches any value.

use std::fs;
use std::path::Path;

use scmi_common::ProductInfo;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScmiError};

/// Resolved encoding information for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingInfo {
    pub source_name: String,
    pub units: Option<String>,
    pub standard_name: Option<String>,
}

/// Looks up encoding information for a product.
pub trait EncodingLookup {
    fn lookup(&self, product: &ProductInfo) -> Option<EncodingInfo>;
}

fn wildcard() -> String {
    "*".to_string()
}

/// One table entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingEntry {
    #[serde(default = "wildcard")]
    pub satellite: String,
    #[serde(default = "wildcard")]
    pub instrument: String,
    #[serde(default = "wildcard")]
    pub product_name: String,
    pub source_name: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub standard_name: Option<String>,
}

impl EncodingEntry {
    fn matches(&self, product: &ProductInfo) -> bool {
        fn field(pattern: &str, value: &str) -> bool {
            pattern == "*" || pattern.eq_ignore_ascii_case(value)
        }
        field(&self.satellite, &product.satellite)
            && field(&self.instrument, &product.instrument)
            && field(&self.product_name, &product.product_name)
    }
}

/// Ordered list of encoding entries, first match wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodingTable {
    pub products: Vec<EncodingEntry>,
}

impl EncodingTable {
    /// Table used when no file is configured: every product is from SSEC.
    pub fn builtin() -> Self {
        Self {
            products: vec![EncodingEntry {
                satellite: wildcard(),
                instrument: wildcard(),
                product_name: wildcard(),
                source_name: "SSEC".to_string(),
                units: None,
                standard_name: None,
            }],
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| ScmiError::config(format!("invalid encoding table: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

impl EncodingLookup for EncodingTable {
    fn lookup(&self, product: &ProductInfo) -> Option<EncodingInfo> {
        self.products
            .iter()
            .find(|entry| entry.matches(product))
            .map(|entry| EncodingInfo {
                source_name: entry.source_name.clone(),
                units: entry.units.clone(),
                standard_name: entry.standard_name.clone(),
            })
    }
}
