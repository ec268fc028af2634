//! Tiled SCMI output for gridded products.
//!
//! [`ScmiBackend`] drives the whole pipeline for one product: encoding lookup,
//! tile planning, coordinate and pixel quantization, filename resolution and
//! the per-tile container writes. Files created by a failed invocation are
//! removed unless `keep_intermediate` is set.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use scmi_common::{GridDefinition, GriddedProduct, ProductInfo};
use tracing::{debug, error, info, warn};

use crate::attributes::{production_location, AttributeContext, AttributeRules, AttributeTable};
use crate::config::{BackendConfig, OutputRequest};
use crate::container::{ContainerFactory, NetCdfFactory};
use crate::encoding::{EncodingInfo, EncodingLookup};
use crate::error::{Result, ScmiError};
use crate::geometry::{Tile, TileGeometry};
use crate::legacy::{Hdf5LegacyPatch, LegacyPatch};
use crate::naming::{resolve_filename, FilenameFields};
use crate::projection_attrs::{derive_projection_attributes, CoordinateScaling};
use crate::quantize::{QuantizationParams, Quantizer};
use crate::tile_file::{CoordinateAxes, EncodedAxis, TileFileWriter};

/// Largest number of positions a 16-bit coordinate variable can address.
pub const MAX_COORDINATE_POSITIONS: usize = 1 << 14;

/// Filename `data_type` field for the u16 pixel variable.
const PIXEL_DATA_TYPE: &str = "uint2";

/// Standard name used for reflectance-like products without one.
const REFLECTANCE_STANDARD_NAME: &str = "toa_bidirectional_reflectance";

/// Writes gridded products as tiled SCMI NetCDF files.
pub struct ScmiBackend {
    config: BackendConfig,
    encodings: Box<dyn EncodingLookup>,
    factory: Box<dyn ContainerFactory>,
    legacy_patch: Box<dyn LegacyPatch>,
    attribute_table: AttributeTable,
    attribute_rules: AttributeRules,
    created_files: Vec<PathBuf>,
}

impl ScmiBackend {
    /// Backend writing NetCDF-4 files with the standard SCMI global attributes.
    pub fn new(config: BackendConfig, encodings: impl EncodingLookup + 'static) -> Self {
        Self {
            config,
            encodings: Box::new(encodings),
            factory: Box::new(NetCdfFactory),
            legacy_patch: Box::new(Hdf5LegacyPatch),
            attribute_table: AttributeTable::scmi_globals(),
            attribute_rules: AttributeRules::standard(),
            created_files: Vec::new(),
        }
    }

    /// Replace the container factory.
    pub fn with_factory(mut self, factory: impl ContainerFactory + 'static) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Replace the patch applied to each tile when `fix_awips` is set.
    pub fn with_legacy_patch(mut self, patch: impl LegacyPatch + 'static) -> Self {
        self.legacy_patch = Box::new(patch);
        self
    }

    /// Replace the global attribute table and its derivation rules.
    pub fn with_attributes(mut self, table: AttributeTable, rules: AttributeRules) -> Self {
        self.attribute_table = table;
        self.attribute_rules = rules;
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Files created by the most recent invocation, in creation order.
    pub fn created_files(&self) -> &[PathBuf] {
        &self.created_files
    }

    /// Write every non-empty tile of a product.
    ///
    /// Returns the path of the last tile written, or `None` when every tile
    /// was fully masked. The resolved valid range is recorded on the product.
    pub fn create_output_from_product(
        &mut self,
        product: &mut GriddedProduct,
        request: &OutputRequest,
    ) -> Result<Option<PathBuf>> {
        self.created_files.clear();
        request.validate().map_err(ScmiError::Configuration)?;

        let encoding = self.encodings.lookup(&product.info).ok_or_else(|| {
            ScmiError::config(format!(
                "no encoding entry for {}/{}/{}",
                product.info.satellite, product.info.instrument, product.info.product_name
            ))
        })?;

        let geometry = TileGeometry::plan(product.shape(), request.tiling, request.tile_offset)?;
        let projection = derive_projection_attributes(&product.grid)?;
        let coordinates = encode_coordinates(&product.grid, &geometry)?;

        let (valid_min, valid_max) = match resolve_valid_range(product) {
            Some(range) => range,
            None => {
                warn!(product = %product.name(), "Product has no valid data, no tiles written");
                return Ok(None);
            }
        };
        product.set_valid_range(valid_min, valid_max);
        let quantization =
            Quantizer::pixel().calc_factor_offset(valid_min, valid_max, product.info.bit_depth())?;
        debug!(
            product = %product.name(),
            scale_factor = quantization.scale_factor,
            add_offset = quantization.add_offset,
            "Computed pixel quantization"
        );

        let scene_time = product.info.begin_time + Duration::minutes(self.config.time_shift_minutes);
        let location = production_location(self.config.organization.as_deref());
        let units = resolve_units(&encoding, &product.info);
        let standard_name = resolve_standard_name(&encoding, &product.info);
        let source_name = request
            .source_name
            .clone()
            .unwrap_or_else(|| encoding.source_name.clone());
        let dataset_name = format!("AWIPS_{}", product.info.product_name);

        let writer = TileFileWriter {
            quantization: &quantization,
            units: &units,
            standard_name: &standard_name,
            coordinates: &coordinates,
            projection: projection.as_ref(),
            dataset_name: &dataset_name,
            sector_id: &request.sector_id,
            creation_time: Utc::now(),
            compress: self.config.compress,
            attribute_table: &self.attribute_table,
            attribute_rules: &self.attribute_rules,
        };

        info!(
            product = %product.name(),
            tiles = geometry.number_of_tiles(),
            tile_shape = ?geometry.tile_shape,
            "Writing product to AWIPS SCMI files"
        );

        let job = TileJob {
            product,
            geometry: &geometry,
            quantization: &quantization,
            writer: &writer,
            request,
            source_name: &source_name,
            scene_time,
            production_location: &location,
        };

        let result = job.run(
            &self.config,
            self.factory.as_ref(),
            self.legacy_patch.as_ref(),
            &mut self.created_files,
        );

        if let Err(e) = &result {
            error!(product = %product.name(), error = %e, "Error while filling in NC file with data");
            if !self.config.keep_intermediate {
                remove_created(&self.created_files);
            }
        }
        result
    }
}

/// Per-invocation state shared by every tile of one product.
struct TileJob<'a> {
    product: &'a GriddedProduct,
    geometry: &'a TileGeometry,
    quantization: &'a QuantizationParams,
    writer: &'a TileFileWriter<'a>,
    request: &'a OutputRequest,
    source_name: &'a str,
    scene_time: DateTime<Utc>,
    production_location: &'a str,
}

impl TileJob<'_> {
    fn run(
        &self,
        config: &BackendConfig,
        factory: &dyn ContainerFactory,
        patch: &dyn LegacyPatch,
        created: &mut Vec<PathBuf>,
    ) -> Result<Option<PathBuf>> {
        let mut buffer = TileBuffer::new(self.geometry.tile_shape);
        let mut last = None;

        for tile in self.geometry.tiles() {
            if !buffer.load(self.product, self.geometry, &tile) {
                info!(tile = tile.tile_number, "Tile has no valid data, skipping");
                continue;
            }
            buffer.encode(self.quantization);

            let path = self.tile_path(&tile)?;
            if path.exists() {
                if config.overwrite_existing {
                    warn!(path = %path.display(), "AWIPS file already exists, will overwrite");
                    fs::remove_file(&path)?;
                } else {
                    return Err(ScmiError::Collision(path));
                }
            }

            info!(tile = tile.tile_number, path = %path.display(), "Writing tile");
            created.push(path.clone());
            let file = factory.create(&path)?;
            let ctx = AttributeContext {
                product: self.product,
                geometry: self.geometry,
                tile: &tile,
                scene_time: self.scene_time,
                production_location: self.production_location,
            };
            self.writer.write(file, &tile, &buffer.codes, &ctx)?;

            if config.fix_awips {
                patch.apply(&path)?;
            }
            last = Some(path);
        }

        Ok(last)
    }

    fn tile_path(&self, tile: &Tile) -> Result<PathBuf> {
        let info = &self.product.info;
        let (rows, columns) = self.geometry.tile_shape;
        let fields = FilenameFields {
            source_name: self.source_name,
            satellite: &info.satellite,
            instrument: &info.instrument,
            product_name: &info.product_name,
            sector_id: &self.request.sector_id,
            tile_number: tile.tile_number,
            begin_time: self.scene_time,
            grid_name: &self.product.grid.grid_name,
            rows,
            columns,
            data_type: PIXEL_DATA_TYPE,
        };
        let name = resolve_filename(&self.request.output_pattern, &fields)?;
        Ok(self.request.output_dir.join(name))
    }
}

/// Scratch space reused across the tiles of one product.
struct TileBuffer {
    width: usize,
    values: Vec<f32>,
    mask: Vec<bool>,
    codes: Vec<u16>,
}

impl TileBuffer {
    fn new((height, width): (usize, usize)) -> Self {
        let len = height * width;
        Self {
            width,
            values: vec![0.0; len],
            mask: vec![true; len],
            codes: vec![0; len],
        }
    }

    /// Copy the tile's window of the product. Returns false when no sample is valid.
    fn load(&mut self, product: &GriddedProduct, geometry: &TileGeometry, tile: &Tile) -> bool {
        self.mask.fill(true);
        let (rows, cols) = tile.scene_window(geometry);
        let scene_width = geometry.scene_shape.1;
        let data = product.data();
        let mask = product.mask();

        let mut any_valid = false;
        for (local_row, row) in rows.enumerate() {
            let src = row * scene_width + cols.start..row * scene_width + cols.end;
            let dst = local_row * self.width..local_row * self.width + cols.len();
            self.values[dst.clone()].copy_from_slice(&data[src.clone()]);
            self.mask[dst].copy_from_slice(&mask[src.clone()]);
            any_valid |= data[src.clone()]
                .iter()
                .zip(&mask[src])
                .any(|(v, &masked)| !masked && v.is_finite());
        }
        any_valid
    }

    fn encode(&mut self, q: &QuantizationParams) {
        for ((code, &value), &masked) in self.codes.iter_mut().zip(&self.values).zip(&self.mask) {
            *code = q.encode(value, masked) as u16;
        }
    }
}

/// Explicit valid range where given, else the data range.
fn resolve_valid_range(product: &GriddedProduct) -> Option<(f64, f64)> {
    let info = &product.info;
    match (info.valid_min, info.valid_max) {
        (Some(lo), Some(hi)) => Some((lo, hi)),
        (lo, hi) => {
            let (data_lo, data_hi) = product.data_range()?;
            Some((lo.unwrap_or(data_lo), hi.unwrap_or(data_hi)))
        }
    }
}

fn resolve_units(encoding: &EncodingInfo, info: &ProductInfo) -> String {
    encoding
        .units
        .clone()
        .or_else(|| info.units.clone())
        .unwrap_or_else(|| "1".to_string())
}

fn resolve_standard_name(encoding: &EncodingInfo, info: &ProductInfo) -> String {
    if let Some(name) = encoding.standard_name.clone().or_else(|| info.standard_name.clone()) {
        return name;
    }
    match info.data_kind.as_str() {
        "reflectance" | "albedo" => REFLECTANCE_STANDARD_NAME.to_string(),
        kind => kind.to_string(),
    }
}

/// Encode the pixel-center axes of every tile as scaled 16-bit codes.
///
/// Grids without a grid mapping still get axes, in their native units.
fn encode_coordinates(grid: &GridDefinition, geometry: &TileGeometry) -> Result<CoordinateAxes> {
    let (rows, cols) = geometry.tiled_shape();
    for (axis, len) in [("y", rows), ("x", cols)] {
        if len > MAX_COORDINATE_POSITIONS {
            return Err(ScmiError::Capacity {
                axis,
                len,
                max: MAX_COORDINATE_POSITIONS,
            });
        }
    }

    let scaling = CoordinateScaling::for_grid(grid);
    Ok(CoordinateAxes {
        y: encode_axis(&grid.y_axis(rows), grid.cell_height.abs(), scaling.factor),
        x: encode_axis(&grid.x_axis(cols), grid.cell_width.abs(), scaling.factor),
        units: scaling.units,
    })
}

fn encode_axis(values: &[f64], cell: f64, factor: f64) -> EncodedAxis {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let add_offset = min * factor;
    let scale_factor = cell * factor;
    let codes = values
        .iter()
        .map(|v| ((v * factor - add_offset) / scale_factor).round() as i16)
        .collect();
    EncodedAxis {
        codes,
        scale_factor,
        add_offset,
    }
}

fn remove_created(paths: &[PathBuf]) {
    for path in paths {
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed partial output"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_axis_descending() {
        let axis = encode_axis(&[15.0, 5.0, -5.0], 10.0, 1.0);
        assert_eq!(axis.codes, vec![2, 1, 0]);
        assert_eq!(axis.add_offset, -5.0);
        assert_eq!(axis.scale_factor, 10.0);
    }

    #[test]
    fn test_encode_axis_geostationary_units() {
        let h = 35_786_023.0;
        let axis = encode_axis(&[-h * 1e-3, 0.0, h * 1e-3], h * 1e-3, 1e6 / h);
        assert_eq!(axis.codes, vec![0, 1, 2]);
        assert!((axis.add_offset + 1000.0).abs() < 1e-6);
        assert!((axis.scale_factor - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_standard_name() {
        let encoding = EncodingInfo {
            source_name: "SSEC".to_string(),
            units: None,
            standard_name: None,
        };
        let mut info = test_utils::product_info("ch02");
        info.data_kind = "reflectance".to_string();
        assert_eq!(resolve_standard_name(&encoding, &info), REFLECTANCE_STANDARD_NAME);

        info.data_kind = "brightness_temperature".to_string();
        assert_eq!(resolve_standard_name(&encoding, &info), "brightness_temperature");

        info.standard_name = Some("toa_brightness_temperature".to_string());
        assert_eq!(resolve_standard_name(&encoding, &info), "toa_brightness_temperature");
    }

    #[test]
    fn test_resolve_units_default() {
        let encoding = EncodingInfo {
            source_name: "SSEC".to_string(),
            units: None,
            standard_name: None,
        };
        let mut info = test_utils::product_info("ch02");
        info.units = None;
        assert_eq!(resolve_units(&encoding, &info), "1");
    }
}
