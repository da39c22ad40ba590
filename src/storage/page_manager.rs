use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::common::{
    page_size, ArchiveError, PageId, RecordId, Result, SlotId, PAGE_FILE_EXTENSION,
};
use crate::record::{self, Schema, Value};
use crate::storage::disk::DiskManager;
use crate::storage::page::{RecordPage, RecordPageRef};

/// Location of a record found by a key scan.
struct KeyMatch {
    page_id: PageId,
    slot_id: SlotId,
    page: Vec<u8>,
}

/// PageManager owns the pages of every record type.
///
/// Each type lives in its own page file, created by its first insert. A type
/// without a file has no pages. Pages are scanned in allocation order and
/// slots in index order; every insert and delete writes the touched page
/// back before returning.
pub struct PageManager {
    pages_dir: PathBuf,
    files: HashMap<String, DiskManager>,
}

impl PageManager {
    /// Creates a page manager storing page files under `pages_dir`.
    pub fn new<P: AsRef<Path>>(pages_dir: P) -> Self {
        Self {
            pages_dir: pages_dir.as_ref().to_path_buf(),
            files: HashMap::new(),
        }
    }

    /// Stores `encoded` unless a record with `pk_value` already exists.
    ///
    /// The record goes into the first free slot of the first page with room;
    /// a new page is appended only when every page is full.
    pub fn insert(&mut self, schema: &Schema, encoded: &[u8], pk_value: &Value) -> Result<RecordId> {
        assert_eq!(
            encoded.len(),
            schema.record_width(),
            "Encoded record must be record_width bytes"
        );

        let disk = self.disk_or_create(schema)?;
        let mut target: Option<(PageId, Vec<u8>)> = None;

        for page_id in page_ids(disk) {
            let data = read_page(disk, schema, page_id)?;
            let page = RecordPageRef::new(&data, schema.record_width());

            if find_in_page(schema, &page, pk_value).is_some() {
                return Err(ArchiveError::DuplicateKey {
                    type_name: schema.type_name().to_string(),
                    key: pk_value.to_string(),
                });
            }
            if target.is_none() && !page.is_full() {
                target = Some((page_id, data));
            }
        }

        let (page_id, mut data) = match target {
            Some(target) => target,
            None => {
                let page_id = disk.allocate_page()?;
                info!(
                    "Allocated page {} for type '{}'",
                    page_id.as_u32(),
                    schema.type_name()
                );
                (page_id, vec![0u8; disk.page_size()])
            }
        };

        let mut page = RecordPage::new(&mut data, schema.record_width());
        page.set_page_id(page_id);
        let slot_id = page.insert_record(encoded)?;
        disk.write_page(page_id, &data)?;

        debug!(
            "Inserted key {} into '{}' at page {} slot {}",
            pk_value,
            schema.type_name(),
            page_id.as_u32(),
            slot_id.as_u16()
        );
        Ok(RecordId::new(page_id, slot_id))
    }

    /// Returns the record whose primary key equals `pk_value`.
    pub fn search(&mut self, schema: &Schema, pk_value: &Value) -> Result<Option<Vec<Value>>> {
        let found = self.find_key(schema, pk_value)?;
        Ok(found.and_then(|m| {
            RecordPageRef::new(&m.page, schema.record_width())
                .get_record(m.slot_id)
                .map(|bytes| record::decode(schema, bytes))
        }))
    }

    /// Removes the record whose primary key equals `pk_value`.
    /// Returns whether a record was removed.
    pub fn delete(&mut self, schema: &Schema, pk_value: &Value) -> Result<bool> {
        let Some(mut m) = self.find_key(schema, pk_value)? else {
            return Ok(false);
        };

        let mut page = RecordPage::new(&mut m.page, schema.record_width());
        let removed = page.delete_record(m.slot_id)?;
        self.disk_or_create(schema)?.write_page(m.page_id, &m.page)?;

        debug!(
            "Deleted key {} from '{}' at page {} slot {}",
            pk_value,
            schema.type_name(),
            m.page_id.as_u32(),
            m.slot_id.as_u16()
        );
        Ok(removed)
    }

    /// Returns every stored record in page and slot order.
    pub fn scan(&mut self, schema: &Schema) -> Result<Vec<Vec<Value>>> {
        let mut records = Vec::new();
        let Some(disk) = self.disk(schema)? else {
            return Ok(records);
        };
        for page_id in page_ids(disk) {
            let data = read_page(disk, schema, page_id)?;
            let page = RecordPageRef::new(&data, schema.record_width());
            for slot_id in page.occupied_slots() {
                if let Some(bytes) = page.get_record(slot_id) {
                    records.push(record::decode(schema, bytes));
                }
            }
        }
        Ok(records)
    }

    /// Returns the number of stored records of `schema`'s type.
    pub fn record_count(&mut self, schema: &Schema) -> Result<usize> {
        let mut count = 0;
        let Some(disk) = self.disk(schema)? else {
            return Ok(count);
        };
        for page_id in page_ids(disk) {
            let data = read_page(disk, schema, page_id)?;
            count += RecordPageRef::new(&data, schema.record_width()).record_count() as usize;
        }
        Ok(count)
    }

    /// Returns the number of pages allocated for `schema`'s type.
    pub fn page_count(&mut self, schema: &Schema) -> Result<u32> {
        Ok(self.disk(schema)?.map_or(0, DiskManager::get_num_pages))
    }

    fn find_key(&mut self, schema: &Schema, pk_value: &Value) -> Result<Option<KeyMatch>> {
        let Some(disk) = self.disk(schema)? else {
            return Ok(None);
        };
        for page_id in page_ids(disk) {
            let data = read_page(disk, schema, page_id)?;
            let page = RecordPageRef::new(&data, schema.record_width());
            if let Some(slot_id) = find_in_page(schema, &page, pk_value) {
                return Ok(Some(KeyMatch {
                    page_id,
                    slot_id,
                    page: data,
                }));
            }
        }
        Ok(None)
    }

    /// Returns the disk manager for `schema`'s type, or None if the type has
    /// no page file yet.
    fn disk(&mut self, schema: &Schema) -> Result<Option<&DiskManager>> {
        let type_name = schema.type_name();
        if !self.files.contains_key(type_name) {
            let path = self.page_file(type_name);
            if !path.exists() {
                return Ok(None);
            }
            self.open_file(schema, path)?;
        }
        Ok(self.files.get(type_name))
    }

    /// Like [`PageManager::disk`], creating the page file if needed.
    fn disk_or_create(&mut self, schema: &Schema) -> Result<&DiskManager> {
        let type_name = schema.type_name();
        if !self.files.contains_key(type_name) {
            fs::create_dir_all(&self.pages_dir)?;
            let path = self.page_file(type_name);
            self.open_file(schema, path)?;
        }
        Ok(&self.files[type_name])
    }

    fn open_file(&mut self, schema: &Schema, path: PathBuf) -> Result<()> {
        let disk = DiskManager::new(path, page_size(schema.record_width()))?;
        self.files.insert(schema.type_name().to_string(), disk);
        Ok(())
    }

    fn page_file(&self, type_name: &str) -> PathBuf {
        self.pages_dir
            .join(format!("{}.{}", type_name, PAGE_FILE_EXTENSION))
    }
}

fn page_ids(disk: &DiskManager) -> impl Iterator<Item = PageId> {
    (0..disk.get_num_pages()).map(PageId::new)
}

fn read_page(disk: &DiskManager, schema: &Schema, page_id: PageId) -> Result<Vec<u8>> {
    let mut data = vec![0u8; disk.page_size()];
    disk.read_page(page_id, &mut data)?;
    RecordPageRef::new(&data, schema.record_width())
        .validate(page_id)
        .map_err(|reason| ArchiveError::CorruptPage {
            type_name: schema.type_name().to_string(),
            page: page_id.as_u32(),
            reason,
        })?;
    Ok(data)
}

/// Compares only the key field of each occupied slot.
fn find_in_page(schema: &Schema, page: &RecordPageRef<'_>, pk_value: &Value) -> Option<SlotId> {
    let pk_index = schema.primary_key_index();
    page.occupied_slots().find(|&slot_id| {
        page.get_record(slot_id)
            .map(|bytes| record::decode_field(schema, bytes, pk_index) == *pk_value)
            .unwrap_or(false)
    })
}
