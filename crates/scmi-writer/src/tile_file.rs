//! Writes one SCMI tile into a container.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::attributes::{apply_attributes, AttributeContext, AttributeRules, AttributeTable, AttributeValue};
use crate::container::{ContainerResult, TileContainer, VariableSpec, VariableType};
use crate::geometry::Tile;
use crate::projection_attrs::ProjectionAttributes;
use crate::quantize::QuantizationParams;

pub const ROW_DIM: &str = "y";
pub const COL_DIM: &str = "x";
pub const DATA_VAR: &str = "data";
pub const Y_VAR: &str = "y";
pub const X_VAR: &str = "x";

pub const CREATOR: &str = "UW SSEC - CSPP Polar2Grid";

/// One encoded coordinate axis covering every tile of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAxis {
    pub codes: Vec<i16>,
    pub scale_factor: f64,
    pub add_offset: f64,
}

/// Encoded y/x coordinate axes and their units.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateAxes {
    pub y: EncodedAxis,
    pub x: EncodedAxis,
    pub units: &'static str,
}

/// Everything a tile needs that is shared by all tiles of a product.
pub struct TileFileWriter<'a> {
    pub quantization: &'a QuantizationParams,
    pub units: &'a str,
    pub standard_name: &'a str,
    pub coordinates: &'a CoordinateAxes,
    pub projection: Option<&'a ProjectionAttributes>,
    pub dataset_name: &'a str,
    pub sector_id: &'a str,
    pub creation_time: DateTime<Utc>,
    pub compress: bool,
    pub attribute_table: &'a AttributeTable,
    pub attribute_rules: &'a AttributeRules,
}

fn code_value(code: i64) -> AttributeValue {
    match u16::try_from(code) {
        Ok(v) => AttributeValue::UShort(v),
        Err(_) => AttributeValue::Int(code as i32),
    }
}

impl TileFileWriter<'_> {
    /// Populate and close a tile file.
    ///
    /// `pixels` holds the tile's encoded samples in row-major order. On error
    /// the container is dropped without an explicit close and the partial
    /// file stays on disk.
    pub fn write(
        &self,
        mut file: Box<dyn TileContainer>,
        tile: &Tile,
        pixels: &[u16],
        ctx: &AttributeContext<'_>,
    ) -> ContainerResult<()> {
        let (h, w) = ctx.geometry.tile_shape;

        debug!(tile = tile.tile_number, "Creating dimensions");
        file.add_dimension(ROW_DIM, h)?;
        file.add_dimension(COL_DIM, w)?;

        debug!(tile = tile.tile_number, "Creating variables");
        self.create_data_variable(file.as_mut())?;
        self.write_coordinates(file.as_mut(), self.coordinates, tile)?;

        debug!(tile = tile.tile_number, "Creating global attributes");
        file.set_attribute("creator", CREATOR.into())?;
        file.set_attribute(
            "creation_time",
            self.creation_time.format("%Y-%m-%dT%H:%M:%S").to_string().into(),
        )?;
        file.set_attribute("dataset_name", self.dataset_name.into())?;
        file.set_attribute("sector_id", self.sector_id.into())?;
        apply_attributes(file.as_mut(), self.attribute_table, self.attribute_rules, ctx)?;

        if let Some(projection) = self.projection {
            debug!(tile = tile.tile_number, "Creating projection attributes");
            file.add_variable(&VariableSpec {
                name: projection.variable_name,
                var_type: VariableType::I32,
                dims: &[],
                fill_value: None,
                compress: false,
            })?;
            for (name, value) in &projection.attributes {
                file.put_variable_attribute(projection.variable_name, name, value.clone())?;
            }
            file.put_variable_attribute(DATA_VAR, "grid_mapping", projection.variable_name.into())?;
        }

        debug!(tile = tile.tile_number, "Writing image data");
        file.put_u16_values(DATA_VAR, pixels)?;

        file.close()
    }

    fn create_data_variable(&self, file: &mut dyn TileContainer) -> ContainerResult<()> {
        let q = self.quantization;
        file.add_variable(&VariableSpec {
            name: DATA_VAR,
            var_type: VariableType::U16,
            dims: &[ROW_DIM, COL_DIM],
            fill_value: Some(q.fill_code),
            compress: self.compress,
        })?;

        let attrs: [(&str, AttributeValue); 6] = [
            ("scale_factor", AttributeValue::Float(q.scale_factor as f32)),
            ("add_offset", AttributeValue::Float(q.add_offset as f32)),
            ("units", self.units.into()),
            ("standard_name", self.standard_name.into()),
            ("valid_min", code_value(q.code_min())),
            ("valid_max", code_value(q.code_max())),
        ];
        for (name, value) in attrs {
            file.put_variable_attribute(DATA_VAR, name, value)?;
        }
        file.put_variable_attribute(DATA_VAR, "coordinates", format!("{} {}", Y_VAR, X_VAR).into())
    }

    fn write_coordinates(
        &self,
        file: &mut dyn TileContainer,
        coords: &CoordinateAxes,
        tile: &Tile,
    ) -> ContainerResult<()> {
        let axes = [
            (Y_VAR, ROW_DIM, &coords.y, tile.rows.clone(), "projection_y_coordinate"),
            (X_VAR, COL_DIM, &coords.x, tile.cols.clone(), "projection_x_coordinate"),
        ];
        for (name, dim, axis, range, standard_name) in axes {
            file.add_variable(&VariableSpec {
                name,
                var_type: VariableType::I16,
                dims: &[dim],
                fill_value: None,
                compress: self.compress,
            })?;
            file.put_variable_attribute(name, "scale_factor", axis.scale_factor.into())?;
            file.put_variable_attribute(name, "add_offset", axis.add_offset.into())?;
            file.put_variable_attribute(name, "units", coords.units.into())?;
            file.put_variable_attribute(name, "standard_name", standard_name.into())?;
            file.put_i16_values(name, &axis.codes[range])?;
        }
        Ok(())
    }
}
