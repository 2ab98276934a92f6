use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Ordered, read-only list of the images a run will process.
///
/// Indices into the catalog are what the partitioner and the remainder pool hand out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    images: Vec<PathBuf>,
}

impl Catalog {
    /// Lists every regular file in `dir`, skipping platform housekeeping files.
    pub fn discover(dir: &Path) -> Result<Self> {
        let images = common::file_utils::list_files(dir).map_err(|source| Error::ListInput {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self { images })
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            images: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.images.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.images.iter().map(PathBuf::as_path)
    }
}
