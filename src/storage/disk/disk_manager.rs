use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;
use parking_lot::Mutex;

use crate::common::{PageId, Result};

/// DiskManager reads and writes the pages of one page file.
/// All pages of a file share one size, fixed when the manager is opened.
pub struct DiskManager {
    /// The page file
    file: Mutex<File>,
    /// Size of every page in bytes
    page_size: usize,
    /// Number of pages currently allocated
    num_pages: AtomicU32,
    /// Number of disk reads performed
    num_reads: AtomicU32,
    /// Number of disk writes performed
    num_writes: AtomicU32,
}

impl DiskManager {
    /// Opens the page file at `path`, creating it if it doesn't exist.
    pub fn new<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        assert!(page_size > 0, "Page size must be positive");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        // A trailing partial page is never exposed; it gets overwritten by the next allocation
        let num_pages = (file_size / page_size as u64) as u32;

        debug!(
            "Opened {} ({} pages of {} bytes)",
            path.as_ref().display(),
            num_pages,
            page_size
        );

        Ok(Self {
            file: Mutex::new(file),
            page_size,
            num_pages: AtomicU32::new(num_pages),
            num_reads: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
        })
    }

    /// Reads a page from disk into the provided buffer.
    /// The buffer must be exactly `page_size` bytes.
    pub fn read_page(&self, page_id: PageId, data: &mut [u8]) -> Result<()> {
        assert_eq!(data.len(), self.page_size, "Buffer must be page_size bytes");

        let offset = page_id.as_u32() as u64 * self.page_size as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        // Reading beyond the file yields zeros
        let mut filled = 0;
        while filled < data.len() {
            let n = file.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data[filled..].fill(0);

        self.num_reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes a whole page to disk in a single write.
    /// The buffer must be exactly `page_size` bytes.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), self.page_size, "Buffer must be page_size bytes");

        let offset = page_id.as_u32() as u64 * self.page_size as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Appends a zero-initialized page and returns its page ID.
    pub fn allocate_page(&self) -> Result<PageId> {
        let page_id = PageId::new(self.num_pages.load(Ordering::SeqCst));

        let zeros = vec![0u8; self.page_size];
        self.write_page(page_id, &zeros)?;
        // Only count the page once it exists on disk
        self.num_pages.fetch_add(1, Ordering::SeqCst);

        Ok(page_id)
    }

    /// Returns the number of pages currently allocated.
    pub fn get_num_pages(&self) -> u32 {
        self.num_pages.load(Ordering::Relaxed)
    }

    /// Returns the number of disk reads performed.
    pub fn get_num_reads(&self) -> u32 {
        self.num_reads.load(Ordering::Relaxed)
    }

    /// Returns the number of disk writes performed.
    pub fn get_num_writes(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let file = self.file.get_mut();
        let _ = file.sync_all();
    }
}
