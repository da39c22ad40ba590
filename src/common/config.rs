use std::path::{Path, PathBuf};

/// Number of record slots in every page
pub const SLOTS_PER_PAGE: usize = 10;

/// Encoded width of a string field in bytes
pub const STRING_WIDTH: usize = 32;

/// Encoded width of an integer field in bytes
pub const INTEGER_WIDTH: usize = 8;

/// Page header: page_num (4) + record_count (4) + occupancy bitmap (2)
pub const PAGE_HEADER_SIZE: usize = 10;

/// File name of the persisted catalog inside the data directory
pub const CATALOG_FILE_NAME: &str = "catalog.txt";

/// Directory (inside the data directory) holding one page file per type
pub const PAGES_DIR_NAME: &str = "pages";

/// Extension of per-type page files
pub const PAGE_FILE_EXTENSION: &str = "bin";

/// Returns the on-disk size of a page holding records of `record_width` bytes.
pub fn page_size(record_width: usize) -> usize {
    PAGE_HEADER_SIZE + SLOTS_PER_PAGE * record_width
}

/// Where an archive keeps its persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    data_dir: PathBuf,
}

impl ArchiveConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE_NAME)
    }

    /// Directory holding the per-type page files.
    pub fn pages_dir(&self) -> PathBuf {
        self.data_dir.join(PAGES_DIR_NAME)
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
