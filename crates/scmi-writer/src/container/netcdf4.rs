//! NetCDF-4 tile files using the netcdf library.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ContainerFactory, ContainerResult, TileContainer, VariableSpec, VariableType};
use crate::attributes::{AttributeTarget, AttributeValue};
use crate::error::ContainerError;

/// Deflate level used when compression is requested.
const DEFLATE_LEVEL: i32 = 4;

impl From<AttributeValue> for netcdf::AttributeValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Text(v) => netcdf::AttributeValue::Str(v),
            AttributeValue::Short(v) => netcdf::AttributeValue::Short(v),
            AttributeValue::UShort(v) => netcdf::AttributeValue::Ushort(v),
            AttributeValue::Int(v) => netcdf::AttributeValue::Int(v),
            AttributeValue::Float(v) => netcdf::AttributeValue::Float(v),
            AttributeValue::Double(v) => netcdf::AttributeValue::Double(v),
        }
    }
}

/// An open NetCDF-4 file.
pub struct NetCdfContainer {
    file: netcdf::FileMut,
    path: PathBuf,
}

impl NetCdfContainer {
    pub fn create(path: &Path) -> ContainerResult<Self> {
        let file = netcdf::create(path)?;
        debug!(path = %path.display(), "Created NetCDF file");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn variable_mut(&mut self, name: &str) -> ContainerResult<netcdf::VariableMut<'_>> {
        self.file
            .variable_mut(name)
            .ok_or_else(|| ContainerError::UnknownVariable(name.to_string()))
    }
}

impl AttributeTarget for NetCdfContainer {
    fn has_attribute(&self, name: &str) -> bool {
        self.file.attributes().any(|attr| attr.name() == name)
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> ContainerResult<()> {
        self.file
            .add_attribute(name, netcdf::AttributeValue::from(value))?;
        Ok(())
    }
}

impl TileContainer for NetCdfContainer {
    fn add_dimension(&mut self, name: &str, len: usize) -> ContainerResult<()> {
        self.file.add_dimension(name, len)?;
        Ok(())
    }

    fn add_variable(&mut self, spec: &VariableSpec<'_>) -> ContainerResult<()> {
        let (name, dims) = (spec.name, spec.dims);
        let mut var = match spec.var_type {
            VariableType::U16 => self.file.add_variable::<u16>(name, dims)?,
            VariableType::I16 => self.file.add_variable::<i16>(name, dims)?,
            VariableType::I32 => self.file.add_variable::<i32>(name, dims)?,
        };

        if spec.compress && !dims.is_empty() {
            var.set_compression(DEFLATE_LEVEL, true)?;
        }

        if let Some(fill) = spec.fill_value {
            let out_of_range =
                || ContainerError::Other(format!("fill value {} does not fit variable '{}'", fill, name));
            match spec.var_type {
                VariableType::U16 => var.set_fill_value(u16::try_from(fill).map_err(|_| out_of_range())?)?,
                VariableType::I16 => var.set_fill_value(i16::try_from(fill).map_err(|_| out_of_range())?)?,
                VariableType::I32 => var.set_fill_value(i32::try_from(fill).map_err(|_| out_of_range())?)?,
            }
        }
        Ok(())
    }

    fn put_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: AttributeValue,
    ) -> ContainerResult<()> {
        self.variable_mut(variable)?
            .put_attribute(name, netcdf::AttributeValue::from(value))?;
        Ok(())
    }

    fn put_u16_values(&mut self, variable: &str, values: &[u16]) -> ContainerResult<()> {
        self.variable_mut(variable)?.put_values(values, ..)?;
        Ok(())
    }

    fn put_i16_values(&mut self, variable: &str, values: &[i16]) -> ContainerResult<()> {
        self.variable_mut(variable)?.put_values(values, ..)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> ContainerResult<()> {
        let NetCdfContainer { file, path } = *self;
        file.close()?;
        debug!(path = %path.display(), "Closed NetCDF file");
        Ok(())
    }
}

/// Creates [`NetCdfContainer`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfFactory;

impl ContainerFactory for NetCdfFactory {
    fn create(&self, path: &Path) -> ContainerResult<Box<dyn TileContainer>> {
        Ok(Box::new(NetCdfContainer::create(path)?))
    }
}
