use bytes::{Buf, BufMut};

use crate::common::{
    page_size, ArchiveError, PageId, Result, SlotId, PAGE_HEADER_SIZE, SLOTS_PER_PAGE,
};

/// Record page layout:
///
/// +------------------+
/// | Page Header      |  (PAGE_HEADER_SIZE bytes)
/// +------------------+
/// | slot 0           |  (record_width bytes)
/// | slot 1           |
/// | ...              |
/// | slot 9           |
/// +------------------+
///
/// Header fields are big-endian:
///   - page_num: u32
///   - record_count: u32 (number of occupied slots)
///   - bitmap: u16 (bit i set = slot i occupied)
///
/// An empty slot is all zeros. A freshly allocated, all-zero page is a valid
/// empty page.
const PAGE_NUM_OFFSET: usize = 0;

/// Offset of record_count field in header
const RECORD_COUNT_OFFSET: usize = 4;

/// Offset of the occupancy bitmap in header
const BITMAP_OFFSET: usize = 8;

/// Bits of the bitmap that may be set
const BITMAP_MASK: u16 = (1 << SLOTS_PER_PAGE) - 1;

/// Read-only view of a record page.
pub struct RecordPageRef<'a> {
    data: &'a [u8],
    record_width: usize,
}

impl<'a> RecordPageRef<'a> {
    /// Creates a read-only view. The buffer must be exactly one page.
    pub fn new(data: &'a [u8], record_width: usize) -> Self {
        assert_eq!(data.len(), page_size(record_width));
        Self { data, record_width }
    }

    /// Returns the page number stored in the header.
    pub fn page_id(&self) -> PageId {
        PageId::new((&self.data[PAGE_NUM_OFFSET..]).get_u32())
    }

    /// Returns the number of occupied slots.
    pub fn record_count(&self) -> u32 {
        (&self.data[RECORD_COUNT_OFFSET..]).get_u32()
    }

    /// Returns the occupancy bitmap.
    pub fn bitmap(&self) -> u16 {
        (&self.data[BITMAP_OFFSET..]).get_u16()
    }

    pub fn is_occupied(&self, slot_id: SlotId) -> bool {
        slot_id.as_usize() < SLOTS_PER_PAGE && self.bitmap() & (1 << slot_id.as_u16()) != 0
    }

    pub fn is_full(&self) -> bool {
        self.bitmap() & BITMAP_MASK == BITMAP_MASK
    }

    /// Returns the lowest free slot, if any.
    pub fn first_free_slot(&self) -> Option<SlotId> {
        let bitmap = self.bitmap();
        (0..SLOTS_PER_PAGE as u16)
            .find(|&i| bitmap & (1 << i) == 0)
            .map(SlotId::new)
    }

    /// Returns the occupied slots in index order.
    pub fn occupied_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        let bitmap = self.bitmap();
        (0..SLOTS_PER_PAGE as u16)
            .filter(move |&i| bitmap & (1 << i) != 0)
            .map(SlotId::new)
    }

    /// Returns the encoded record in `slot_id`, or None if the slot is empty.
    pub fn get_record(&self, slot_id: SlotId) -> Option<&'a [u8]> {
        if !self.is_occupied(slot_id) {
            return None;
        }
        Some(&self.data[slot_range(slot_id, self.record_width)])
    }

    /// Checks the header against the page's position in its file.
    pub fn validate(&self, expected: PageId) -> std::result::Result<(), String> {
        let bitmap = self.bitmap();
        let count = self.record_count();
        if bitmap & !BITMAP_MASK != 0 {
            return Err(format!("bitmap {:#06x} has bits beyond slot {}", bitmap, SLOTS_PER_PAGE - 1));
        }
        if count != bitmap.count_ones() {
            return Err(format!(
                "record count {} does not match {} occupied slots",
                count,
                bitmap.count_ones()
            ));
        }
        // An allocated page that was never written is all zeros
        if bitmap != 0 && self.page_id() != expected {
            return Err(format!("header claims {}", self.page_id()));
        }
        Ok(())
    }
}

/// RecordPage interprets a page buffer as ten fixed-width record slots.
pub struct RecordPage<'a> {
    data: &'a mut [u8],
    record_width: usize,
}

impl<'a> RecordPage<'a> {
    /// Creates a view over the given page buffer.
    /// The buffer must be exactly `page_size(record_width)` bytes.
    pub fn new(data: &'a mut [u8], record_width: usize) -> Self {
        assert_eq!(data.len(), page_size(record_width));
        Self { data, record_width }
    }

    /// Initializes a fresh, empty page.
    pub fn init(&mut self, page_id: PageId) {
        self.data.fill(0);
        self.set_page_id(page_id);
    }

    /// Returns a read-only view of this page.
    pub fn view(&self) -> RecordPageRef<'_> {
        RecordPageRef {
            data: &*self.data,
            record_width: self.record_width,
        }
    }

    pub fn set_page_id(&mut self, page_id: PageId) {
        (&mut self.data[PAGE_NUM_OFFSET..]).put_u32(page_id.as_u32());
    }

    fn set_record_count(&mut self, count: u32) {
        (&mut self.data[RECORD_COUNT_OFFSET..]).put_u32(count);
    }

    fn set_bitmap(&mut self, bitmap: u16) {
        (&mut self.data[BITMAP_OFFSET..]).put_u16(bitmap);
    }

    /// Writes `record` into the lowest free slot and returns that slot.
    pub fn insert_record(&mut self, record: &[u8]) -> Result<SlotId> {
        assert_eq!(record.len(), self.record_width, "Record must be record_width bytes");

        let slot_id = self.view().first_free_slot().ok_or(ArchiveError::PageFull)?;
        let range = slot_range(slot_id, self.record_width);
        self.data[range].copy_from_slice(record);

        let view = self.view();
        let (bitmap, count) = (view.bitmap(), view.record_count());
        self.set_bitmap(bitmap | (1 << slot_id.as_u16()));
        self.set_record_count(count + 1);

        Ok(slot_id)
    }

    /// Empties `slot_id`. Other slots keep their positions.
    /// Returns false if the slot was already empty.
    pub fn delete_record(&mut self, slot_id: SlotId) -> Result<bool> {
        if slot_id.as_usize() >= SLOTS_PER_PAGE {
            return Err(ArchiveError::InvalidSlotId(slot_id.as_u16()));
        }
        let view = self.view();
        if !view.is_occupied(slot_id) {
            return Ok(false);
        }
        let (bitmap, count) = (view.bitmap(), view.record_count());

        let range = slot_range(slot_id, self.record_width);
        self.data[range].fill(0);
        self.set_bitmap(bitmap & !(1 << slot_id.as_u16()));
        self.set_record_count(count - 1);

        Ok(true)
    }
}

fn slot_range(slot_id: SlotId, record_width: usize) -> std::ops::Range<usize> {
    let start = PAGE_HEADER_SIZE + slot_id.as_usize() * record_width;
    start..start + record_width
}
