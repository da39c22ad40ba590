//! Dune Archive - a minimal page-based record store
//!
//! Record types are declared with a fixed list of typed fields and a primary
//! key field. Records are encoded into fixed-width blocks and stored in
//! ten-slot pages, one page file per type. Records are created, looked up and
//! deleted by exact primary key.
//!
//! # Architecture
//!
//! - **Record** (`record`): field types, values, schemas and the fixed-width codec
//!   - `FieldType`: the `str` (32 bytes) and `int` (8 bytes) field kinds
//!   - `Schema`: field layout, primary key position and record width
//!   - `encode` / `decode`: values to and from record blocks
//!
//! - **Catalog** (`catalog`): the type registry, persisted as `catalog.txt`
//!
//! - **Storage** (`storage`): page files and slot management
//!   - `DiskManager`: page-granular reads and writes of one page file
//!   - `RecordPage`: header, occupancy bitmap and ten fixed-width slots
//!   - `PageManager`: key-unique insert, key search and delete across pages
//!
//! - **Archive** (`archive`): the facade tying the above together
//!
//! - **Interpreter** (`interpreter`): script commands and the audit log
//!
//! # Example
//!
//! ```rust,no_run
//! use dune_archive::{Archive, ArchiveConfig, Value};
//!
//! let mut archive = Archive::open(ArchiveConfig::new("archive-data")).unwrap();
//!
//! archive
//!     .create_type("planet", &[("name", "str"), ("size", "int")], 0)
//!     .unwrap();
//! archive
//!     .create_record("planet", &[Value::from("Arrakis"), Value::Integer(12)])
//!     .unwrap();
//!
//! let found = archive.search_record("planet", &Value::from("Arrakis")).unwrap();
//! assert_eq!(found, Some(vec![Value::from("Arrakis"), Value::Integer(12)]));
//! ```

pub mod archive;
pub mod catalog;
pub mod common;
pub mod interpreter;
pub mod record;
pub mod storage;

// Re-export commonly used types at the crate root
pub use archive::Archive;
pub use common::{ArchiveConfig, ArchiveError, PageId, RecordId, Result, SlotId};
pub use record::{FieldType, Schema, Value};
