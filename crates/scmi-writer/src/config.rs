//! Configuration for SCMI tile output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default output filename pattern.
pub const DEFAULT_OUTPUT_PATTERN: &str = "{source_name}_AWIPS_{satellite}_{instrument}_{product_name}_{sector_id}_T{tile_number:03d}_{begin_time:%Y%m%d_%H%M}.nc";

/// Per-backend policy flags.
///
/// Every field is owned by the instance; two backends never share defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Deflate-compress tile variables.
    pub compress: bool,

    /// Replace existing tile files instead of failing.
    pub overwrite_existing: bool,

    /// Keep already written tiles when a later tile fails.
    pub keep_intermediate: bool,

    /// Strip `_NCProperties` from written files for old AWIPS readers.
    pub fix_awips: bool,

    /// Minutes added to product begin times (testing aid).
    pub time_shift_minutes: i64,

    /// Value for the `production_location` attribute. Falls back to the hostname.
    pub organization: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            compress: false,
            overwrite_existing: false,
            keep_intermediate: false,
            fix_awips: false,
            time_shift_minutes: 0,
            organization: None,
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `DEBUG_TIME_SHIFT` (minutes) and `ORGANIZATION`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DEBUG_TIME_SHIFT") {
            if let Ok(minutes) = val.trim().parse() {
                config.time_shift_minutes = minutes;
            }
        }

        if let Ok(val) = std::env::var("ORGANIZATION") {
            if !val.is_empty() {
                config.organization = Some(val);
            }
        }

        config
    }
}

/// How a scene is divided into tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiling {
    /// Fixed number of tiles (rows, columns). Trailing pixels that do not
    /// divide evenly are left out of every tile.
    Count { rows: usize, cols: usize },
    /// Fixed tile size in pixels (height, width). Edge tiles may extend past
    /// the scene.
    Size { height: usize, width: usize },
}

impl Default for Tiling {
    fn default() -> Self {
        Tiling::Count { rows: 1, cols: 1 }
    }
}

/// Per-product output request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRequest {
    pub tiling: Tiling,

    /// Tile index (row, column) of this scene's first tile in a larger mosaic.
    pub tile_offset: (usize, usize),

    /// Filename pattern. A pattern without `{field}` markers is used literally.
    pub output_pattern: String,

    pub sector_id: String,

    /// Overrides the encoding table's `source_name`.
    pub source_name: Option<String>,

    /// Directory relative filenames are resolved against.
    pub output_dir: PathBuf,
}

impl Default for OutputRequest {
    fn default() -> Self {
        Self {
            tiling: Tiling::default(),
            tile_offset: (0, 0),
            output_pattern: DEFAULT_OUTPUT_PATTERN.to_string(),
            sector_id: "LCC".to_string(),
            source_name: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl OutputRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        match self.tiling {
            Tiling::Count { rows, cols } if rows == 0 || cols == 0 => {
                Err(format!("tile count must be positive, got {}x{}", rows, cols))
            }
            Tiling::Size { height, width } if height == 0 || width == 0 => {
                Err(format!("tile size must be positive, got {}x{}", height, width))
            }
            _ if self.output_pattern.is_empty() => Err("output pattern is empty".to_string()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_independent() {
        let mut a = BackendConfig::default();
        let b = BackendConfig::default();
        a.organization = Some("SSEC".to_string());
        assert!(b.organization.is_none());
    }

    #[test]
    fn test_validate() {
        let mut request = OutputRequest::default();
        assert!(request.validate().is_ok());

        request.tiling = Tiling::Count { rows: 0, cols: 2 };
        assert!(request.validate().is_err());

        request.tiling = Tiling::Size { height: 100, width: 100 };
        request.output_pattern.clear();
        assert!(request.validate().is_err());
    }
}
