use log::{debug, info};

use crate::catalog::Catalog;
use crate::common::{ArchiveConfig, RecordId, Result};
use crate::record::{self, Schema, Value};
use crate::storage::PageManager;

/// The storage facade: the four record-store operations on top of the
/// catalog, the record codec and the page manager.
///
/// Every record operation starts with a catalog lookup, so a type that was
/// never declared fails with `UnknownType` before any page is touched.
pub struct Archive {
    catalog: Catalog,
    pages: PageManager,
}

impl Archive {
    /// Opens the archive stored under `config.data_dir()`, loading its catalog.
    pub fn open(config: ArchiveConfig) -> Result<Self> {
        let catalog = Catalog::load(config.catalog_path())?;
        let pages = PageManager::new(config.pages_dir());
        info!(
            "Opened archive at {} with {} type(s)",
            config.data_dir().display(),
            catalog.len()
        );
        Ok(Self { catalog, pages })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Declares a record type. `primary_key_index` is 0-based.
    pub fn create_type<N, T>(
        &mut self,
        type_name: &str,
        fields: &[(N, T)],
        primary_key_index: usize,
    ) -> Result<()>
    where
        N: AsRef<str>,
        T: AsRef<str>,
    {
        self.catalog
            .create_type(type_name, fields, primary_key_index)
            .map(|_| ())
    }

    /// Validates, encodes and stores a record.
    pub fn create_record(&mut self, type_name: &str, values: &[Value]) -> Result<RecordId> {
        let schema = self.catalog.get_schema(type_name)?;
        let encoded = record::encode(&schema, values)?;
        let key = &values[schema.primary_key_index()];
        self.pages.insert(&schema, &encoded, key)
    }

    /// Returns the record of `type_name` whose primary key is `key`.
    pub fn search_record(&mut self, type_name: &str, key: &Value) -> Result<Option<Vec<Value>>> {
        let schema = self.catalog.get_schema(type_name)?;
        if !key_matches_type(&schema, key) {
            return Ok(None);
        }
        self.pages.search(&schema, key)
    }

    /// Deletes the record of `type_name` whose primary key is `key`.
    pub fn delete_record(&mut self, type_name: &str, key: &Value) -> Result<bool> {
        let schema = self.catalog.get_schema(type_name)?;
        if !key_matches_type(&schema, key) {
            return Ok(false);
        }
        self.pages.delete(&schema, key)
    }

    /// Like [`Archive::create_record`], converting raw tokens with the type's schema.
    pub fn create_record_tokens<S: AsRef<str>>(
        &mut self,
        type_name: &str,
        tokens: &[S],
    ) -> Result<RecordId> {
        let schema = self.catalog.get_schema(type_name)?;
        let values = schema.parse_values(tokens)?;
        self.create_record(type_name, &values)
    }

    /// Like [`Archive::search_record`] with a raw key token.
    /// A token that is not a valid key for the type finds nothing.
    pub fn search_record_token(
        &mut self,
        type_name: &str,
        token: &str,
    ) -> Result<Option<Vec<Value>>> {
        let schema = self.catalog.get_schema(type_name)?;
        match parse_key(&schema, token) {
            Some(key) => self.pages.search(&schema, &key),
            None => Ok(None),
        }
    }

    /// Like [`Archive::delete_record`] with a raw key token.
    pub fn delete_record_token(&mut self, type_name: &str, token: &str) -> Result<bool> {
        let schema = self.catalog.get_schema(type_name)?;
        match parse_key(&schema, token) {
            Some(key) => self.pages.delete(&schema, &key),
            None => Ok(false),
        }
    }

    /// Returns every record of `type_name` in storage order.
    pub fn scan_records(&mut self, type_name: &str) -> Result<Vec<Vec<Value>>> {
        let schema = self.catalog.get_schema(type_name)?;
        self.pages.scan(&schema)
    }

    /// Returns the number of pages allocated for `type_name`.
    pub fn page_count(&mut self, type_name: &str) -> Result<u32> {
        let schema = self.catalog.get_schema(type_name)?;
        self.pages.page_count(&schema)
    }
}

fn key_matches_type(schema: &Schema, key: &Value) -> bool {
    let matches = key.field_type() == schema.primary_key_field().field_type();
    if !matches {
        debug!(
            "Key {} cannot match {} primary key of '{}'",
            key,
            schema.primary_key_field().field_type(),
            schema.type_name()
        );
    }
    matches
}

fn parse_key(schema: &Schema, token: &str) -> Option<Value> {
    match schema.parse_value(schema.primary_key_index(), token) {
        Ok(key) => Some(key),
        Err(e) => {
            debug!("Key '{}' cannot match any record: {}", token, e);
            None
        }
    }
}
