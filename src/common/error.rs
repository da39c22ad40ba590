use thiserror::Error;

/// Archive error types
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown field type '{0}'")]
    UnknownFieldType(String),

    #[error("Type '{0}' already exists")]
    DuplicateType(String),

    #[error("Invalid definition for type '{type_name}': {reason}")]
    InvalidSchema { type_name: String, reason: String },

    #[error("Type '{0}' not found")]
    UnknownType(String),

    #[error("Type '{type_name}' expects {expected} fields, got {actual}")]
    FieldCountMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Field '{field}' of type '{type_name}' expects {expected}, got '{value}'")]
    FieldTypeMismatch {
        type_name: String,
        field: String,
        expected: String,
        value: String,
    },

    #[error("String value too long for field '{field}' of type '{type_name}': {len} bytes (max {max})")]
    FieldTooLong {
        type_name: String,
        field: String,
        len: usize,
        max: usize,
    },

    #[error("Integer value '{value}' out of range for field '{field}' of type '{type_name}'")]
    IntegerOutOfRange {
        type_name: String,
        field: String,
        value: String,
    },

    #[error("Record with primary key {key} already exists in type '{type_name}'")]
    DuplicateKey { type_name: String, key: String },

    #[error("Page is full")]
    PageFull,

    #[error("Invalid slot ID: {0}")]
    InvalidSlotId(u16),

    #[error("Corrupt catalog at line {line}: {reason}")]
    CorruptCatalog { line: usize, reason: String },

    #[error("Corrupt page {page} of type '{type_name}': {reason}")]
    CorruptPage {
        type_name: String,
        page: u32,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
