use std::fmt;

use crate::common::{ArchiveError, Result, INTEGER_WIDTH, STRING_WIDTH};

/// The field kinds a schema can declare.
/// Every kind has a fixed encoded width, so every record of a schema has the same size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Fixed-width string: 32 bytes, zero-padded
    String,

    /// 64-bit signed integer: 8 bytes, big-endian two's complement
    Integer,
}

impl FieldType {
    /// Resolves a type token (`str` / `int`, case-insensitive).
    pub fn from_token(token: &str) -> Result<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "str" => Ok(FieldType::String),
            "int" => Ok(FieldType::Integer),
            _ => Err(ArchiveError::UnknownFieldType(token.to_string())),
        }
    }

    /// Returns the token used for this type in the catalog file.
    pub fn token(&self) -> &'static str {
        match self {
            FieldType::String => "str",
            FieldType::Integer => "int",
        }
    }

    /// Returns the encoded width in bytes.
    pub fn width(&self) -> usize {
        match self {
            FieldType::String => STRING_WIDTH,
            FieldType::Integer => INTEGER_WIDTH,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "STRING"),
            FieldType::Integer => write!(f, "INTEGER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token() {
        assert_eq!(FieldType::from_token("str").unwrap(), FieldType::String);
        assert_eq!(FieldType::from_token("int").unwrap(), FieldType::Integer);
        assert_eq!(FieldType::from_token("INT").unwrap(), FieldType::Integer);
        assert!(matches!(
            FieldType::from_token("float"),
            Err(ArchiveError::UnknownFieldType(t)) if t == "float"
        ));
    }

    #[test]
    fn test_widths() {
        assert_eq!(FieldType::String.width(), 32);
        assert_eq!(FieldType::Integer.width(), 8);
    }

    #[test]
    fn test_token_roundtrip() {
        for ft in [FieldType::String, FieldType::Integer] {
            assert_eq!(FieldType::from_token(ft.token()).unwrap(), ft);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::String.to_string(), "STRING");
        assert_eq!(FieldType::Integer.to_string(), "INTEGER");
    }
}
