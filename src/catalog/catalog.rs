use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::common::{ArchiveError, Result};
use crate::record::Schema;

/// The registry of record types.
///
/// The catalog is loaded from its file once and written through on every
/// change: a type that `create_type` accepted is on disk before the call
/// returns, and a failed call leaves both the file and the in-memory state
/// untouched.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl Catalog {
    /// Loads the catalog stored at `path`. A missing file is an empty catalog.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No catalog at {}, starting empty", path.display());
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut schemas = BTreeMap::new();
        for (i, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let schema = Schema::deserialize(line).map_err(|e| ArchiveError::CorruptCatalog {
                line: i + 1,
                reason: e.to_string(),
            })?;
            if schemas.contains_key(schema.type_name()) {
                return Err(ArchiveError::CorruptCatalog {
                    line: i + 1,
                    reason: format!("type '{}' declared twice", schema.type_name()),
                });
            }
            schemas.insert(schema.type_name().to_string(), Arc::new(schema));
        }

        info!("Loaded {} type(s) from {}", schemas.len(), path.display());
        Ok(Self { path, schemas })
    }

    /// Declares a new type from `(field name, type token)` pairs.
    /// `primary_key_index` is 0-based.
    pub fn create_type<N, T>(
        &mut self,
        type_name: &str,
        fields: &[(N, T)],
        primary_key_index: usize,
    ) -> Result<Arc<Schema>>
    where
        N: AsRef<str>,
        T: AsRef<str>,
    {
        if self.schemas.contains_key(type_name) {
            return Err(ArchiveError::DuplicateType(type_name.to_string()));
        }
        let schema = Arc::new(Schema::from_tokens(type_name, fields, primary_key_index)?);

        self.schemas
            .insert(type_name.to_string(), Arc::clone(&schema));
        if let Err(e) = self.persist() {
            self.schemas.remove(type_name);
            return Err(e);
        }

        info!(
            "Created type '{}' ({} fields, record width {})",
            type_name,
            schema.field_count(),
            schema.record_width()
        );
        Ok(schema)
    }

    /// Returns the schema of `type_name`.
    pub fn get_schema(&self, type_name: &str) -> Result<Arc<Schema>> {
        self.schemas
            .get(type_name)
            .cloned()
            .ok_or_else(|| ArchiveError::UnknownType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Returns the declared type names in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Rewrites the whole catalog file. The new contents go to a sibling
    /// temp file first and replace the old file with a rename.
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            for schema in self.schemas.values() {
                writeln!(file, "{}", schema.serialize())?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(
            "Persisted {} type(s) to {}",
            self.schemas.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog_in(dir: &TempDir) -> Catalog {
        Catalog::load(dir.path().join("catalog.txt")).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_in(&dir);
        assert!(catalog.is_empty());
        assert!(!dir.path().join("catalog.txt").exists());
    }

    #[test]
    fn test_create_and_get() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);

        catalog
            .create_type("planet", &[("name", "str"), ("size", "int")], 0)
            .unwrap();

        let schema = catalog.get_schema("planet").unwrap();
        assert_eq!(schema.field_count(), 2);
        assert_eq!(schema.record_width(), 40);
        assert!(catalog.contains("planet"));
        assert!(matches!(
            catalog.get_schema("moon"),
            Err(ArchiveError::UnknownType(name)) if name == "moon"
        ));
    }

    #[test]
    fn test_duplicate_type() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);

        catalog.create_type("planet", &[("name", "str")], 0).unwrap();
        let err = catalog
            .create_type("planet", &[("other", "int"), ("x", "int")], 1)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateType(name) if name == "planet"));

        // The original definition is untouched
        assert_eq!(catalog.get_schema("planet").unwrap().field_count(), 1);
    }

    #[test]
    fn test_invalid_schema_leaves_catalog_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);

        assert!(matches!(
            catalog.create_type("planet", &[("name", "str")], 3),
            Err(ArchiveError::InvalidSchema { .. })
        ));
        assert!(matches!(
            catalog.create_type("planet", &[("name", "bool")], 0),
            Err(ArchiveError::InvalidSchema { .. })
        ));
        assert!(catalog.is_empty());
        assert!(!dir.path().join("catalog.txt").exists());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);
        let blocker = dir.path().join("catalog.tmp");
        fs::create_dir(&blocker).unwrap();

        assert!(matches!(
            catalog.create_type("planet", &[("name", "str")], 0),
            Err(ArchiveError::Io(_))
        ));
        assert!(!catalog.contains("planet"));
        assert!(catalog.is_empty());

        fs::remove_dir(&blocker).unwrap();
        catalog.create_type("planet", &[("name", "str")], 0).unwrap();
        assert!(catalog.contains("planet"));
        assert_eq!(catalog_in(&dir).len(), 1);
    }

    #[test]
    fn test_reload() {
        let dir = TempDir::new().unwrap();
        {
            let mut catalog = catalog_in(&dir);
            catalog
                .create_type("fremen", &[("name", "str"), ("tribe", "str"), ("age", "int")], 0)
                .unwrap();
            catalog
                .create_type("planet", &[("name", "str"), ("size", "int")], 1)
                .unwrap();
        }

        let catalog = catalog_in(&dir);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.type_names().collect::<Vec<_>>(), vec!["fremen", "planet"]);
        let planet = catalog.get_schema("planet").unwrap();
        assert_eq!(planet.primary_key_index(), 1);
        assert_eq!(planet.primary_key_field().name(), "size");
    }

    #[test]
    fn test_corrupt_catalog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.txt");
        fs::write(&path, "planet|2|1|name:str,size:int\nbroken line\n").unwrap();

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::CorruptCatalog { line: 2, .. }));
    }
}
