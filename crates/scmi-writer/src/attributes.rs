//! Name-keyed attribute tables and their derivation rules.
//!
//! An [`AttributeTable`] lists attribute names with either a fixed value or
//! no value. Names without a value are derived by an [`AttributeRules`]
//! entry evaluated over an [`AttributeContext`]. Application never replaces
//! an attribute the target already carries.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use scmi_common::{GriddedProduct, ProjFamily};
use tracing::{debug, info};

use crate::error::ContainerError;
use crate::geometry::{Tile, TileGeometry};

/// Attribute value in one of the types SCMI files use.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Short(i16),
    UShort(u16),
    Int(i32),
    Float(f32),
    Double(f64),
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f32> for AttributeValue {
    fn from(v: f32) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Double(v)
    }
}

/// Something that holds named attributes, such as a file's global namespace.
pub trait AttributeTarget {
    fn has_attribute(&self, name: &str) -> bool;
    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<(), ContainerError>;
}

/// Attribute names with fixed values, or `None` to derive the value.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    entries: BTreeMap<String, Option<AttributeValue>>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global attributes of an SCMI tile file.
    pub fn scmi_globals() -> Self {
        let mut table = Self::new().with_fixed("Conventions", "CF-1.7");
        for name in [
            "bit_depth",
            "channel_id",
            "number_product_tiles",
            "pixel_x_size",
            "pixel_y_size",
            "product_center_latitude",
            "product_center_longitude",
            "product_columns",
            "product_name",
            "product_rows",
            "product_tile_height",
            "product_tile_width",
            "production_location",
            "satellite_altitude",
            "satellite_id",
            "satellite_longitude",
            "start_date_time",
            "tile_center_latitude",
            "tile_center_longitude",
            "tile_column_offset",
            "tile_number",
            "tile_row_offset",
        ] {
            table = table.with_derived(name);
        }
        table
    }

    pub fn with_fixed(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.entries.insert(name.to_string(), Some(value.into()));
        self
    }

    pub fn with_derived(mut self, name: &str) -> Self {
        self.entries.insert(name.to_string(), None);
        self
    }

    /// Entries in lexicographic order of name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&AttributeValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable inputs available to derivation rules for one tile.
#[derive(Debug, Clone, Copy)]
pub struct AttributeContext<'a> {
    pub product: &'a GriddedProduct,
    pub geometry: &'a TileGeometry,
    pub tile: &'a Tile,
    /// Product begin time after any configured shift
    pub scene_time: DateTime<Utc>,
    pub production_location: &'a str,
}

impl AttributeContext<'_> {
    /// Geodetic center of the tile, looked up at the pixel in its middle.
    pub fn tile_center(&self) -> Option<(f64, f64)> {
        let (row_offset, col_offset) = self.tile.pixel_offset(self.geometry);
        let (h, w) = self.geometry.tile_shape;
        self.product
            .grid
            .lonlat(row_offset + h / 2, col_offset + w / 2)
    }
}

/// Derives one attribute value. `None` leaves the attribute unset.
pub type DeriveFn = Box<dyn Fn(&AttributeContext<'_>) -> Option<AttributeValue> + Send + Sync>;

/// Derivation rules keyed by attribute name.
pub struct AttributeRules {
    rules: HashMap<String, DeriveFn>,
}

impl std::fmt::Debug for AttributeRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AttributeRules").field("rules", &names).finish()
    }
}

fn int(v: usize) -> Option<AttributeValue> {
    i32::try_from(v).ok().map(AttributeValue::Int)
}

impl AttributeRules {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Register or replace a rule.
    pub fn insert<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&AttributeContext<'_>) -> Option<AttributeValue> + Send + Sync + 'static,
    {
        self.rules.insert(name.to_string(), Box::new(rule));
    }

    pub fn get(&self, name: &str) -> Option<&DeriveFn> {
        self.rules.get(name)
    }

    /// Rules for every derived SCMI global attribute.
    pub fn standard() -> Self {
        let mut r = Self::empty();

        r.insert("tile_number", |c| int(c.tile.tile_number));
        r.insert("tile_row_offset", |c| int(c.tile.pixel_offset(c.geometry).0));
        r.insert("tile_column_offset", |c| int(c.tile.pixel_offset(c.geometry).1));
        r.insert("product_tile_height", |c| int(c.geometry.tile_shape.0));
        r.insert("product_tile_width", |c| int(c.geometry.tile_shape.1));
        // Counts every tile in the layout, including skipped ones
        r.insert("number_product_tiles", |c| int(c.geometry.number_of_tiles()));
        r.insert("product_rows", |c| int(c.geometry.scene_shape.0));
        r.insert("product_columns", |c| int(c.geometry.scene_shape.1));

        r.insert("satellite_id", |c| {
            let info = &c.product.info;
            Some(
                format!(
                    "{}-{}",
                    info.satellite.to_uppercase(),
                    info.instrument.to_uppercase()
                )
                .into(),
            )
        });
        r.insert("product_name", |c| {
            Some(c.product.info.product_name.clone().into())
        });
        r.insert("channel_id", |c| match &c.product.info.channel_id {
            Some(id) => Some(AttributeValue::Text(id.clone())),
            None => Some(AttributeValue::Int(0)),
        });
        r.insert("bit_depth", |c| {
            i32::try_from(c.product.info.bit_depth()).ok().map(AttributeValue::Int)
        });

        r.insert("tile_center_longitude", |c| {
            c.tile_center().map(|(lon, _)| AttributeValue::Float(lon as f32))
        });
        r.insert("tile_center_latitude", |c| {
            c.tile_center().map(|(_, lat)| AttributeValue::Float(lat as f32))
        });
        r.insert("product_center_longitude", |c| {
            c.product.grid.center_lonlat().map(|(lon, _)| lon.into())
        });
        r.insert("product_center_latitude", |c| {
            c.product.grid.center_lonlat().map(|(_, lat)| lat.into())
        });

        r.insert("satellite_altitude", |c| {
            c.product.grid.proj.h.map(AttributeValue::Double)
        });
        r.insert("satellite_longitude", |c| match c.product.grid.family() {
            ProjFamily::Geostationary => Some(AttributeValue::Float(c.product.grid.proj.lon_0 as f32)),
            _ => None,
        });

        r.insert("pixel_x_size", |c| Some((c.product.grid.cell_width / 1000.0).into()));
        r.insert("pixel_y_size", |c| Some((c.product.grid.cell_height / 1000.0).into()));

        r.insert("start_date_time", |c| {
            Some(c.scene_time.format("%Y-%m-%dT%H:%M:%S").to_string().into())
        });
        r.insert("production_location", |c| {
            Some(c.production_location.to_string().into())
        });

        r
    }
}

impl Default for AttributeRules {
    fn default() -> Self {
        Self::standard()
    }
}

/// Apply a table to a target.
///
/// Names are visited in lexicographic order. Attributes already on the
/// target are kept. Names with no value and no rule are logged and skipped.
/// Returns the number of attributes written.
pub fn apply_attributes<T: AttributeTarget + ?Sized>(
    target: &mut T,
    table: &AttributeTable,
    rules: &AttributeRules,
    ctx: &AttributeContext<'_>,
) -> Result<usize, ContainerError> {
    let mut written = 0;
    for (name, value) in table.iter() {
        if target.has_attribute(name) {
            debug!(attribute = name, "Attribute already set");
            continue;
        }
        let value = match value {
            Some(v) => Some(v.clone()),
            None => match rules.get(name) {
                Some(rule) => rule(ctx),
                None => {
                    info!(attribute = name, "No rule to derive attribute");
                    continue;
                }
            },
        };
        if let Some(value) = value {
            target.set_attribute(name, value)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Value for `production_location`: the configured organization, else the hostname.
pub fn production_location(organization: Option<&str>) -> String {
    match organization {
        Some(org) => org.to_string(),
        None => {
            tracing::warn!(
                "ORGANIZATION not set for production_location attribute, using hostname"
            );
            hostname(&HOSTNAME_FILES)
        }
    }
}

const HOSTNAME_FILES: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];

fn hostname(files: &[&str]) -> String {
    let found = files
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty());
    match found {
        Some(name) => name,
        None => {
            tracing::warn!(files = ?files, "Could not read hostname, using localhost");
            "localhost".to_string()
        }
    }
}
