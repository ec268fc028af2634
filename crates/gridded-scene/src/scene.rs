//! Scene documents: grids and products backed by a flat binary workspace.
//!
//! ```json
//! {
//!   "grids": { "lcc_conus": { "grid_name": "lcc_conus", ... } },
//!   "products": [
//!     { "product_name": "ch13", "satellite": "goes16", "instrument": "abi",
//!       "data_kind": "brightness_temperature", "begin_time": "2024-05-01T18:00:00Z",
//!       "grid": "lcc_conus", "data": "ch13", "fill_value": -999.0 }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use scmi_common::{GridDefinition, GriddedProduct, ProductInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SceneError};
use crate::fbf::Workspace;

/// One product in a scene document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductEntry {
    #[serde(flatten)]
    pub info: ProductInfo,
    /// Name of a grid in [`SceneDocument::grids`]
    pub grid: String,
    /// Stem of the data file
    pub data: String,
    /// Stem of an optional mask file; nonzero samples are invalid
    #[serde(default)]
    pub mask: Option<String>,
    /// Data value marking invalid samples. NaN is always invalid.
    #[serde(default)]
    pub fill_value: Option<f32>,
}

/// Scene document as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub grids: BTreeMap<String, GridDefinition>,
    pub products: Vec<ProductEntry>,
    /// Workspace directory, relative to the document. Defaults to its directory.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
}

/// A loaded scene document bound to its workspace.
#[derive(Debug, Clone)]
pub struct Scene {
    pub document: SceneDocument,
    workspace: Workspace,
}

impl Scene {
    /// Read a scene document from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let document: SceneDocument = serde_json::from_str(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let dir = match &document.workspace {
            Some(ws) if ws.is_absolute() => ws.clone(),
            Some(ws) => base.join(ws),
            None => base.to_path_buf(),
        };
        info!(
            scene = %path.display(),
            workspace = %dir.display(),
            products = document.products.len(),
            "Loaded scene document"
        );
        Ok(Self::new(document, Workspace::new(dir)))
    }

    pub fn new(document: SceneDocument, workspace: Workspace) -> Self {
        Self {
            document,
            workspace,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn product_names(&self) -> Vec<&str> {
        self.document
            .products
            .iter()
            .map(|p| p.info.product_name.as_str())
            .collect()
    }

    /// Load a product's samples and mask from the workspace.
    pub fn load_product(&self, entry: &ProductEntry) -> Result<GriddedProduct> {
        let name = &entry.info.product_name;
        let grid = self
            .document
            .grids
            .get(&entry.grid)
            .ok_or_else(|| SceneError::UnknownGrid {
                product: name.clone(),
                grid: entry.grid.clone(),
            })?
            .clone();

        let (fbf, data) = self.workspace.read_f32(&entry.data)?;
        let expected = grid.height * grid.width;
        if data.len() != expected {
            return Err(scmi_common::CommonError::ShapeMismatch {
                what: "data",
                expected,
                actual: data.len(),
            }
            .into());
        }

        let mut mask: Vec<bool> = data
            .iter()
            .map(|&v| v.is_nan() || entry.fill_value.map_or(false, |fill| v == fill))
            .collect();

        if let Some(mask_stem) = &entry.mask {
            let (_, flags) = self.workspace.read_f32(mask_stem)?;
            if flags.len() != expected {
                return Err(scmi_common::CommonError::ShapeMismatch {
                    what: "mask",
                    expected,
                    actual: flags.len(),
                }
                .into());
            }
            for (m, flag) in mask.iter_mut().zip(flags) {
                *m |= flag != 0.0;
            }
        }

        debug!(
            product = %name,
            file = %fbf.filename(),
            invalid = mask.iter().filter(|&&m| m).count(),
            "Loaded product data"
        );
        Ok(GriddedProduct::new(entry.info.clone(), grid, data, mask)?)
    }
}
