//! Grid loaders.
//!
//! The pipeline only sees the `GridLoader` trait: a source id goes in, a raw
//! `Grid` (possibly containing NaN) comes out. Two implementations ship here:
//!
//! - `FitsLoader`: source ids are FITS file paths (optionally under a root dir)
//! - `MemoryLoader`: grids registered in memory (library callers, tests)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::domain::Grid;
use crate::error::CompositeError;
use crate::io::fits::parse_fits_grid;

/// Source of raw channel grids.
pub trait GridLoader {
    /// Load the grid named by `source_id`.
    ///
    /// Fails with `SourceNotFound` when the source cannot be located or opened,
    /// and with `CorruptData` when it cannot be parsed into a 2-D grid.
    fn load(&self, source_id: &str) -> Result<Grid, CompositeError>;
}

/// Loads FITS files from disk.
#[derive(Debug, Clone, Default)]
pub struct FitsLoader {
    root: Option<PathBuf>,
}

impl FitsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative source ids against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source_id: &str) -> PathBuf {
        let path = Path::new(source_id);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl GridLoader for FitsLoader {
    fn load(&self, source_id: &str) -> Result<Grid, CompositeError> {
        let path = self.resolve(source_id);
        let bytes = std::fs::read(&path).map_err(|e| CompositeError::SourceNotFound {
            source_id: source_id.to_string(),
            reason: format!("{}: {e}", path.display()),
        })?;
        let grid = parse_fits_grid(&bytes).map_err(|e| CompositeError::CorruptData {
            source_id: source_id.to_string(),
            reason: e.to_string(),
        })?;
        debug!("loaded {} grid from {}", grid.shape(), path.display());
        Ok(grid)
    }
}

/// Serves grids registered in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    grids: HashMap<String, Grid>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_id: impl Into<String>, grid: Grid) {
        self.grids.insert(source_id.into(), grid);
    }

    pub fn with(mut self, source_id: impl Into<String>, grid: Grid) -> Self {
        self.insert(source_id, grid);
        self
    }
}

impl GridLoader for MemoryLoader {
    fn load(&self, source_id: &str) -> Result<Grid, CompositeError> {
        self.grids
            .get(source_id)
            .cloned()
            .ok_or_else(|| CompositeError::SourceNotFound {
                source_id: source_id.to_string(),
                reason: "no grid registered under this id".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Shape;
    use crate::io::fits::write_fits_f32;

    #[test]
    fn fits_loader_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let grid = Grid::from_fn(3, 4, |r, c| (r * 4 + c) as f64);
        write_fits_f32(&dir.path().join("green.fits"), &grid).unwrap();

        let loader = FitsLoader::with_root(dir.path());
        let loaded = loader.load("green.fits").unwrap();
        assert_eq!(loaded.shape(), Shape::new(3, 4));
        assert_eq!(loaded.get(2, 3), 11.0);
    }

    #[test]
    fn missing_file_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FitsLoader::with_root(dir.path()).load("nope.fits").unwrap_err();
        assert!(matches!(err, CompositeError::SourceNotFound { ref source_id, .. } if source_id == "nope.fits"));
    }

    #[test]
    fn unparseable_file_is_corrupt_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.fits");
        std::fs::write(&path, b"definitely not a FITS file").unwrap();
        let err = FitsLoader::new().load(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, CompositeError::CorruptData { .. }));
    }

    #[test]
    fn oversized_header_is_corrupt_data() {
        let mut text = String::new();
        for (key, value) in [
            ("SIMPLE", "T"),
            ("BITPIX", "-64"),
            ("NAXIS", "2"),
            ("NAXIS1", "4294967296"),
            ("NAXIS2", "4294967296"),
        ] {
            text.push_str(&format!("{:<80}", format!("{key:<8}= {value:>20}")));
        }
        text.push_str(&format!("{:<2480}", "END"));

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blue.fits"), text).unwrap();
        let err = FitsLoader::with_root(dir.path()).load("blue.fits").unwrap_err();
        assert!(matches!(err, CompositeError::CorruptData { ref source_id, .. } if source_id == "blue.fits"));
    }

    #[test]
    fn memory_loader_serves_registered_grids() {
        let loader = MemoryLoader::new().with("b", Grid::filled(Shape::new(2, 2), 1.0));
        assert_eq!(loader.load("b").unwrap().shape(), Shape::new(2, 2));
        assert!(matches!(loader.load("a"), Err(CompositeError::SourceNotFound { .. })));
    }
}
