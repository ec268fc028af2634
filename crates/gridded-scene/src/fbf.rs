//! Flat binary format (FBF) files.
//!
//! Each file holds one little-endian array with no header. The element type
//! and shape live in the filename: `stem.type.cols.rows` for 2D arrays and
//! `stem.type.cols.rows.planes` for 3D arrays (minor to major dimension).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SceneError};

/// Element type of a flat binary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbfType {
    Real4,
    Real8,
    Int1,
    Int2,
    Int4,
    Int8,
    Uint1,
    Uint2,
    Uint4,
    Uint8,
}

impl FbfType {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "real4" => FbfType::Real4,
            "real8" => FbfType::Real8,
            "int1" => FbfType::Int1,
            "int2" => FbfType::Int2,
            "int4" => FbfType::Int4,
            "int8" => FbfType::Int8,
            "uint1" => FbfType::Uint1,
            "uint2" => FbfType::Uint2,
            "uint4" => FbfType::Uint4,
            "uint8" => FbfType::Uint8,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FbfType::Real4 => "real4",
            FbfType::Real8 => "real8",
            FbfType::Int1 => "int1",
            FbfType::Int2 => "int2",
            FbfType::Int4 => "int4",
            FbfType::Int8 => "int8",
            FbfType::Uint1 => "uint1",
            FbfType::Uint2 => "uint2",
            FbfType::Uint4 => "uint4",
            FbfType::Uint8 => "uint8",
        }
    }

    /// Size of one element in bytes.
    pub fn byte_size(&self) -> usize {
        match self {
            FbfType::Int1 | FbfType::Uint1 => 1,
            FbfType::Int2 | FbfType::Uint2 => 2,
            FbfType::Real4 | FbfType::Int4 | FbfType::Uint4 => 4,
            FbfType::Real8 | FbfType::Int8 | FbfType::Uint8 => 8,
        }
    }

    /// Decode little-endian bytes to f32 samples.
    fn decode(&self, bytes: &[u8]) -> Vec<f32> {
        let size = self.byte_size();
        bytes
            .chunks_exact(size)
            .map(|c| match self {
                FbfType::Real4 => f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                FbfType::Real8 => f64::from_le_bytes(eight(c)) as f32,
                FbfType::Int1 => c[0] as i8 as f32,
                FbfType::Uint1 => c[0] as f32,
                FbfType::Int2 => i16::from_le_bytes([c[0], c[1]]) as f32,
                FbfType::Uint2 => u16::from_le_bytes([c[0], c[1]]) as f32,
                FbfType::Int4 => i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32,
                FbfType::Uint4 => u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32,
                FbfType::Int8 => i64::from_le_bytes(eight(c)) as f32,
                FbfType::Uint8 => u64::from_le_bytes(eight(c)) as f32,
            })
            .collect()
    }
}

fn eight(c: &[u8]) -> [u8; 8] {
    [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]
}

/// A parsed flat binary filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FbfName {
    pub stem: String,
    pub data_type: FbfType,
    /// Shape from major to minor dimension, e.g. `[rows, cols]`
    pub shape: Vec<usize>,
}

impl FbfName {
    /// Parse a filename such as `image_I01.real4.6400.10167`.
    pub fn parse(filename: &str) -> Result<Self> {
        let parts: Vec<&str> = filename.split('.').collect();
        if parts.len() != 4 && parts.len() != 5 {
            return Err(SceneError::InvalidName(filename.to_string()));
        }

        let data_type = FbfType::parse(parts[1]).ok_or_else(|| SceneError::UnknownType {
            name: filename.to_string(),
            type_name: parts[1].to_string(),
        })?;

        // Filenames list dimensions minor to major
        let shape = parts[2..]
            .iter()
            .rev()
            .map(|p| p.parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| SceneError::InvalidName(filename.to_string()))?;

        Ok(Self {
            stem: parts[0].to_string(),
            data_type,
            shape,
        })
    }

    pub fn filename(&self) -> String {
        let dims: Vec<String> = self.shape.iter().rev().map(|d| d.to_string()).collect();
        format!("{}.{}.{}", self.stem, self.data_type.as_str(), dims.join("."))
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Fail if any file in `dir` already uses `stem`.
pub fn check_stem(dir: &Path, stem: &str) -> Result<()> {
    debug!(stem, "Checking stem");
    let prefix = format!("{}.", stem);
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            return Err(SceneError::StemConflict(stem.to_string()));
        }
    }
    Ok(())
}

/// A directory treated as a collection of flat binary arrays.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All parseable flat binary files in the workspace, sorted by stem.
    pub fn variables(&self) -> Result<Vec<FbfName>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy();
            match FbfName::parse(&filename) {
                Ok(name) => names.push(name),
                Err(e) => debug!(file = %filename, error = %e, "Skipping non-FBF file"),
            }
        }
        names.sort_by(|a, b| a.stem.cmp(&b.stem));
        Ok(names)
    }

    /// Locate the single file for `stem`.
    pub fn find(&self, stem: &str) -> Result<(PathBuf, FbfName)> {
        let mut matches: Vec<FbfName> = self
            .variables()?
            .into_iter()
            .filter(|n| n.stem == stem)
            .collect();
        match matches.len() {
            0 => Err(SceneError::NotFound(stem.to_string())),
            1 => {
                let name = matches.remove(0);
                Ok((self.dir.join(name.filename()), name))
            }
            _ => Err(SceneError::Ambiguous(stem.to_string())),
        }
    }

    /// Read the array for `stem`, converting any element type to f32.
    pub fn read_f32(&self, stem: &str) -> Result<(FbfName, Vec<f32>)> {
        let (path, name) = self.find(stem)?;
        let bytes = fs::read(&path)?;
        let expected = name.element_count() * name.data_type.byte_size();
        if bytes.len() != expected {
            return Err(SceneError::SizeMismatch {
                path,
                expected,
                actual: bytes.len(),
            });
        }
        debug!(path = %path.display(), shape = ?name.shape, "Read flat binary file");
        let values = name.data_type.decode(&bytes);
        Ok((name, values))
    }

    /// Write a 2D f32 array as `stem.real4.cols.rows`, refusing to reuse a stem.
    pub fn write_f32(&self, stem: &str, rows: usize, cols: usize, data: &[f32]) -> Result<PathBuf> {
        if data.len() != rows * cols {
            warn!(stem, rows, cols, len = data.len(), "Array length does not match shape");
            return Err(SceneError::SizeMismatch {
                path: self.dir.join(stem),
                expected: rows * cols * 4,
                actual: data.len() * 4,
            });
        }
        check_stem(&self.dir, stem)?;
        let name = FbfName {
            stem: stem.to_string(),
            data_type: FbfType::Real4,
            shape: vec![rows, cols],
        };
        let path = self.dir.join(name.filename());
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        let name = FbfName::parse("image_I01.real4.6400.10167").unwrap();
        assert_eq!(name.stem, "image_I01");
        assert_eq!(name.data_type, FbfType::Real4);
        assert_eq!(name.shape, vec![10167, 6400]);
        assert_eq!(name.filename(), "image_I01.real4.6400.10167");
    }

    #[test]
    fn test_parse_name_3d() {
        let name = FbfName::parse("cube.uint2.4.3.2").unwrap();
        assert_eq!(name.shape, vec![2, 3, 4]);
        assert_eq!(name.element_count(), 24);
    }

    #[test]
    fn test_parse_name_errors() {
        assert!(matches!(FbfName::parse("image.real4"), Err(SceneError::InvalidName(_))));
        assert!(matches!(
            FbfName::parse("image.float9.10.10"),
            Err(SceneError::UnknownType { .. })
        ));
        assert!(matches!(FbfName::parse("image.real4.ten.10"), Err(SceneError::InvalidName(_))));
    }

    #[test]
    fn test_decode_types() {
        assert_eq!(FbfType::Int2.decode(&(-5i16).to_le_bytes()), vec![-5.0]);
        assert_eq!(FbfType::Uint1.decode(&[200]), vec![200.0]);
        assert_eq!(FbfType::Int1.decode(&[0xff]), vec![-1.0]);
        assert_eq!(FbfType::Real8.decode(&2.5f64.to_le_bytes()), vec![2.5]);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.write_f32("ch13", 2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let (name, values) = ws.read_f32("ch13").unwrap();
        assert_eq!(name.shape, vec![2, 3]);
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_stem_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.write_f32("ch13", 1, 1, &[1.0]).unwrap();
        assert!(matches!(
            ws.write_f32("ch13", 1, 1, &[2.0]),
            Err(SceneError::StemConflict(_))
        ));
        assert!(check_stem(dir.path(), "ch14").is_ok());
    }

    #[test]
    fn test_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.real4.2.2"), [0u8; 8]).unwrap();
        let ws = Workspace::new(dir.path());
        assert!(matches!(
            ws.read_f32("bad"),
            Err(SceneError::SizeMismatch { expected: 16, actual: 8, .. })
        ));
    }

    #[test]
    fn test_ambiguous_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.uint1.1.1"), [1u8]).unwrap();
        std::fs::write(dir.path().join("a.uint1.1.2"), [1u8, 2]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        let ws = Workspace::new(dir.path());
        assert!(matches!(ws.read_f32("a"), Err(SceneError::Ambiguous(_))));
        assert!(matches!(ws.read_f32("b"), Err(SceneError::NotFound(_))));
        assert_eq!(ws.variables().unwrap().len(), 2);
    }
}
