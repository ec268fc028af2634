//! In-memory container for inspecting tile output.
//!
//! [`MemoryFactory::create`] creates an empty placeholder file at the
//! requested path so collision checks and cleanup behave as they do for real
//! files. The populated container is recorded when it is closed.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{ContainerFactory, ContainerResult, TileContainer, VariableSpec, VariableType};
use crate::attributes::{AttributeTarget, AttributeValue};
use crate::error::ContainerError;

/// Values held by a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    Empty,
    U16(Vec<u16>),
    I16(Vec<i16>),
}

#[derive(Debug, Clone)]
pub struct MemoryVariable {
    pub var_type: VariableType,
    pub dims: Vec<String>,
    pub fill_value: Option<i64>,
    pub compress: bool,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub data: VariableData,
}

impl MemoryVariable {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// A closed or open in-memory tile file.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    pub path: PathBuf,
    pub dimensions: Vec<(String, usize)>,
    pub variables: BTreeMap<String, MemoryVariable>,
    pub attributes: BTreeMap<String, AttributeValue>,
    closed_files: Option<Arc<Mutex<BTreeMap<PathBuf, MemoryContainer>>>>,
}

impl MemoryContainer {
    pub fn dimension(&self, name: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, len)| *len)
    }

    pub fn variable(&self, name: &str) -> Option<&MemoryVariable> {
        self.variables.get(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    fn variable_mut(&mut self, name: &str) -> ContainerResult<&mut MemoryVariable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| ContainerError::UnknownVariable(name.to_string()))
    }

    fn expected_len(&self, var: &MemoryVariable) -> usize {
        var.dims
            .iter()
            .map(|d| self.dimension(d).unwrap_or(0))
            .product()
    }

    fn check_len(&self, variable: &str, len: usize) -> ContainerResult<()> {
        let var = self
            .variables
            .get(variable)
            .ok_or_else(|| ContainerError::UnknownVariable(variable.to_string()))?;
        let expected = self.expected_len(var);
        if len != expected {
            return Err(ContainerError::Other(format!(
                "variable '{}' expects {} values, got {}",
                variable, expected, len
            )));
        }
        Ok(())
    }
}

impl AttributeTarget for MemoryContainer {
    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) -> ContainerResult<()> {
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }
}

impl TileContainer for MemoryContainer {
    fn add_dimension(&mut self, name: &str, len: usize) -> ContainerResult<()> {
        if self.dimension(name).is_some() {
            return Err(ContainerError::Other(format!("dimension '{}' already exists", name)));
        }
        self.dimensions.push((name.to_string(), len));
        Ok(())
    }

    fn add_variable(&mut self, spec: &VariableSpec<'_>) -> ContainerResult<()> {
        if let Some(missing) = spec.dims.iter().find(|d| self.dimension(d).is_none()) {
            return Err(ContainerError::Other(format!("unknown dimension '{}'", missing)));
        }
        self.variables.insert(
            spec.name.to_string(),
            MemoryVariable {
                var_type: spec.var_type,
                dims: spec.dims.iter().map(|d| d.to_string()).collect(),
                fill_value: spec.fill_value,
                compress: spec.compress,
                attributes: BTreeMap::new(),
                data: VariableData::Empty,
            },
        );
        Ok(())
    }

    fn put_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: AttributeValue,
    ) -> ContainerResult<()> {
        self.variable_mut(variable)?
            .attributes
            .insert(name.to_string(), value);
        Ok(())
    }

    fn put_u16_values(&mut self, variable: &str, values: &[u16]) -> ContainerResult<()> {
        self.check_len(variable, values.len())?;
        self.variable_mut(variable)?.data = VariableData::U16(values.to_vec());
        Ok(())
    }

    fn put_i16_values(&mut self, variable: &str, values: &[i16]) -> ContainerResult<()> {
        self.check_len(variable, values.len())?;
        self.variable_mut(variable)?.data = VariableData::I16(values.to_vec());
        Ok(())
    }

    fn close(mut self: Box<Self>) -> ContainerResult<()> {
        if let Some(files) = self.closed_files.take() {
            let mut files = files
                .lock()
                .map_err(|_| ContainerError::Other("memory container registry poisoned".into()))?;
            files.insert(self.path.clone(), *self);
        }
        Ok(())
    }
}

/// Creates [`MemoryContainer`]s and keeps the closed ones for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryFactory {
    files: Arc<Mutex<BTreeMap<PathBuf, MemoryContainer>>>,
}

impl MemoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every closed container, keyed by path.
    pub fn closed(&self) -> BTreeMap<PathBuf, MemoryContainer> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl ContainerFactory for MemoryFactory {
    fn create(&self, path: &Path) -> ContainerResult<Box<dyn TileContainer>> {
        File::create(path)?;
        Ok(Box::new(MemoryContainer {
            path: path.to_path_buf(),
            closed_files: Some(Arc::clone(&self.files)),
            ..MemoryContainer::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_must_match_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MemoryFactory::new();
        let path = dir.path().join("tile.nc");
        let mut file = factory.create(&path).unwrap();
        assert!(path.exists());

        file.add_dimension("y", 2).unwrap();
        file.add_dimension("x", 3).unwrap();
        file.add_variable(&VariableSpec {
            name: "data",
            var_type: VariableType::U16,
            dims: &["y", "x"],
            fill_value: Some(65535),
            compress: false,
        })
        .unwrap();

        assert!(file.put_u16_values("data", &[1, 2, 3]).is_err());
        assert!(matches!(
            file.put_u16_values("missing", &[1]),
            Err(ContainerError::UnknownVariable(_))
        ));
        file.put_u16_values("data", &[1, 2, 3, 4, 5, 6]).unwrap();
        file.close().unwrap();

        let closed = factory.closed();
        let tile = &closed[&path];
        assert_eq!(tile.dimension("x"), Some(3));
        assert_eq!(
            tile.variable("data").unwrap().data,
            VariableData::U16(vec![1, 2, 3, 4, 5, 6])
        );
    }

    #[test]
    fn test_unknown_dimension() {
        let mut file = MemoryContainer::default();
        let err = file.add_variable(&VariableSpec {
            name: "y",
            var_type: VariableType::I16,
            dims: &["y"],
            fill_value: None,
            compress: false,
        });
        assert!(err.is_err());
    }
}
