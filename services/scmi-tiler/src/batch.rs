//! Runs the SCMI backend over every selected product of a scene.

use anyhow::{Context, Result};
use gridded_scene::{ProductEntry, Scene};
use scmi_writer::{OutputRequest, ScmiBackend};
use tracing::{error, info, warn};

/// Outcome of a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Products that produced at least one tile
    pub written: usize,
    /// Products whose tiles were all masked
    pub empty: usize,
    /// Names of products that failed
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.written + self.empty
    }
}

/// True when `entry` is selected by the product filter. An empty filter selects everything.
fn selected(entry: &ProductEntry, filter: &[String]) -> bool {
    filter.is_empty() || filter.iter().any(|name| name == &entry.info.product_name)
}

/// Write every selected product of `scene`.
///
/// With `exit_on_error` the first failure aborts the batch; otherwise it is
/// logged and the remaining products are still written.
pub fn run_batch(
    scene: &Scene,
    filter: &[String],
    backend: &mut ScmiBackend,
    request: &OutputRequest,
    exit_on_error: bool,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    let names = scene.product_names();
    for name in filter.iter().filter(|n| !names.contains(&n.as_str())) {
        warn!(product = %name, "Requested product is not in the scene");
    }

    for entry in scene.document.products.iter().filter(|e| selected(e, filter)) {
        let name = entry.info.product_name.as_str();
        let result = scene
            .load_product(entry)
            .with_context(|| format!("failed to load product '{}'", name))
            .and_then(|mut product| {
                backend
                    .create_output_from_product(&mut product, request)
                    .with_context(|| format!("failed to write product '{}'", name))
            });

        match result {
            Ok(Some(last)) => {
                info!(product = %name, last = %last.display(), "Product written");
                summary.written += 1;
            }
            Ok(None) => {
                warn!(product = %name, "Product had no valid tiles");
                summary.empty += 1;
            }
            Err(e) if exit_on_error => return Err(e),
            Err(e) => {
                error!(product = %name, error = %format!("{:#}", e), "Could not create output");
                summary.failed.push(name.to_string());
            }
        }
    }

    Ok(summary)
}
