//! Dataset cache - load the projects table once per process.
//!
//! Every search and option request reads the same immutable [`Dataset`],
//! so it is loaded on first use and shared behind an `Arc` afterwards.

use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LoadResult;
use crate::models::Dataset;
use crate::parser::load_dataset;

/// Lazily loaded, shared dataset.
#[derive(Debug)]
pub struct DatasetCache {
    /// Where the dataset is read from
    path: PathBuf,
    cell: OnceCell<Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: PathBuf::from(path.as_ref()),
            cell: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the dataset has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// The dataset, loading it on the first call.
    ///
    /// A failed load is not cached; the next call tries again.
    pub fn get_or_load(&self) -> LoadResult<Arc<Dataset>> {
        self.cell
            .get_or_try_init(|| load_dataset(&self.path).map(Arc::new))
            .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_loads_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BBDD.csv");
        fs::write(&path, "DEPARTAMENTO,VALOR APORTE (USD)\nCauca,100\nHuila,50\n").unwrap();

        let cache = DatasetCache::new(&path);
        assert!(!cache.is_loaded());

        let first = cache.get_or_load().unwrap();
        assert_eq!(first.len(), 2);

        // Later file changes are not seen
        fs::write(&path, "DEPARTAMENTO\nNariño\n").unwrap();
        let second = cache.get_or_load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.headers().len(), 2);
    }

    #[test]
    fn test_failed_load_retries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BBDD.csv");

        let cache = DatasetCache::new(&path);
        assert!(cache.get_or_load().is_err());
        assert!(!cache.is_loaded());

        fs::write(&path, "DEPARTAMENTO\nCauca\n").unwrap();
        assert_eq!(cache.get_or_load().unwrap().len(), 1);
    }
}
