//! SCMI tiler.
//!
//! Reads gridded products from a scene document and writes them as tiled
//! AWIPS SCMI NetCDF files.

mod batch;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gridded_scene::Scene;
use scmi_writer::{
    BackendConfig, EncodingTable, OutputRequest, ScmiBackend, Tiling, DEFAULT_OUTPUT_PATTERN,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use batch::run_batch;

#[derive(Parser, Debug)]
#[command(name = "scmi-tiler")]
#[command(about = "Write gridded satellite products as tiled AWIPS SCMI NetCDF files")]
struct Args {
    /// Scene document (JSON)
    scene: PathBuf,

    /// Products to write (default: all products in the scene)
    #[arg(short, long, num_args = 1..)]
    products: Vec<String>,

    /// Product encoding table (YAML). Uses the built-in table when omitted.
    #[arg(long)]
    encoding_config: Option<PathBuf>,

    /// Number of tiles (rows, columns)
    #[arg(long, num_args = 2, value_names = ["ROWS", "COLS"], conflicts_with = "tile_size")]
    tile_count: Option<Vec<usize>>,

    /// Tile size in pixels (height, width)
    #[arg(long, num_args = 2, value_names = ["HEIGHT", "WIDTH"])]
    tile_size: Option<Vec<usize>>,

    /// Tile index (row, column) of the first tile in a larger mosaic
    #[arg(long, num_args = 2, value_names = ["ROW", "COL"], default_values_t = [0, 0])]
    tile_offset: Vec<usize>,

    /// Sector identifier written to files and filenames
    #[arg(long)]
    sector_id: String,

    /// Source name written to filenames (default: from the encoding table)
    #[arg(long)]
    source_name: Option<String>,

    /// Output filename pattern
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATTERN)]
    output_pattern: String,

    /// Directory for output files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Deflate-compress tile variables
    #[arg(long)]
    compress: bool,

    /// Overwrite existing tile files
    #[arg(long)]
    overwrite: bool,

    /// Keep tiles already written when a later tile fails
    #[arg(long)]
    keep_intermediate: bool,

    /// Remove `_NCProperties` for older AWIPS readers
    #[arg(long)]
    fix_awips: bool,

    /// Stop at the first product that fails
    #[arg(long)]
    exit_on_error: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn tiling(&self) -> Tiling {
        match (&self.tile_size, &self.tile_count) {
            (Some(size), _) => Tiling::Size {
                height: size[0],
                width: size[1],
            },
            (None, Some(count)) => Tiling::Count {
                rows: count[0],
                cols: count[1],
            },
            (None, None) => Tiling::default(),
        }
    }

    fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::from_env();
        config.compress = self.compress;
        config.overwrite_existing = self.overwrite;
        config.keep_intermediate = self.keep_intermediate;
        config.fix_awips = self.fix_awips;
        config
    }

    fn output_request(&self) -> OutputRequest {
        OutputRequest {
            tiling: self.tiling(),
            tile_offset: (self.tile_offset[0], self.tile_offset[1]),
            output_pattern: self.output_pattern.clone(),
            sector_id: self.sector_id.clone(),
            source_name: self.source_name.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    info!(scene = %args.scene.display(), "Starting SCMI tiler");

    let encodings = match &args.encoding_config {
        Some(path) => EncodingTable::load(path)
            .with_context(|| format!("failed to load encoding table {}", path.display()))?,
        None => EncodingTable::builtin(),
    };

    let request = args.output_request();
    request
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid output options")?;
    fs::create_dir_all(&request.output_dir)
        .with_context(|| format!("failed to create {}", request.output_dir.display()))?;

    let scene = Scene::load(&args.scene)
        .with_context(|| format!("failed to load scene {}", args.scene.display()))?;
    if scene.product_names().is_empty() {
        bail!("scene {} has no products", args.scene.display());
    }

    let mut backend = ScmiBackend::new(args.backend_config(), encodings);
    let summary = run_batch(&scene, &args.products, &mut backend, &request, args.exit_on_error)?;

    info!(
        processed = summary.processed(),
        written = summary.written,
        failed = summary.failed.len(),
        "SCMI tiling completed"
    );

    if !summary.failed.is_empty() {
        bail!(
            "{} product(s) failed: {}",
            summary.failed.len(),
            summary.failed.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_id_is_required() {
        assert!(Args::try_parse_from(["scmi-tiler", "scene.json"]).is_err());
    }

    #[test]
    fn test_source_name_defaults_to_encoding_table() {
        let args = Args::try_parse_from(["scmi-tiler", "scene.json", "--sector-id", "EAST"]).unwrap();
        let request = args.output_request();
        assert_eq!(request.sector_id, "EAST");
        assert!(request.source_name.is_none());

        let args = Args::try_parse_from([
            "scmi-tiler",
            "scene.json",
            "--sector-id",
            "EAST",
            "--source-name",
            "CIRA",
        ])
        .unwrap();
        assert_eq!(args.output_request().source_name.as_deref(), Some("CIRA"));
    }
}
