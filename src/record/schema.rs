use std::collections::HashSet;

use crate::common::{ArchiveError, Result};

use super::{FieldType, Value};

/// Represents a single field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name
    name: String,

    /// Declared kind
    field_type: FieldType,

    /// Byte position of the field inside an encoded record
    offset: usize,
}

impl FieldDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the encoded width of this field.
    pub fn width(&self) -> usize {
        self.field_type.width()
    }

    /// Byte range of the field inside an encoded record.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width()
    }
}

/// The declared shape of a record type.
///
/// Fields are laid out back to back in declaration order, so the offset of a
/// field is the sum of the widths before it and `record_width` is the sum of
/// all widths. A schema never changes once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    fields: Vec<FieldDef>,
    primary_key_index: usize,
    record_width: usize,
}

impl Schema {
    /// Builds a schema from `(name, type)` pairs and a 0-based primary key index.
    pub fn new(
        type_name: impl Into<String>,
        fields: Vec<(String, FieldType)>,
        primary_key_index: usize,
    ) -> Result<Self> {
        let type_name = type_name.into();
        let invalid = |reason: String| ArchiveError::InvalidSchema {
            type_name: type_name.clone(),
            reason,
        };

        if !is_storable_name(&type_name) {
            return Err(invalid(format!("'{}' is not a valid type name", type_name)));
        }
        if fields.is_empty() {
            return Err(invalid("a type needs at least one field".to_string()));
        }
        if primary_key_index >= fields.len() {
            return Err(invalid(format!(
                "primary key index {} out of range for {} fields",
                primary_key_index.saturating_add(1),
                fields.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut defs = Vec::with_capacity(fields.len());
        let mut offset = 0;
        for (name, field_type) in fields {
            if !is_storable_name(&name) {
                return Err(invalid(format!("'{}' is not a valid field name", name)));
            }
            if !seen.insert(name.clone()) {
                return Err(invalid(format!("duplicate field '{}'", name)));
            }
            defs.push(FieldDef {
                name,
                field_type,
                offset,
            });
            offset += field_type.width();
        }

        Ok(Self {
            type_name,
            fields: defs,
            primary_key_index,
            record_width: offset,
        })
    }

    /// Builds a schema from `(name, type token)` pairs as typed by a user.
    pub fn from_tokens<N, T>(
        type_name: &str,
        fields: &[(N, T)],
        primary_key_index: usize,
    ) -> Result<Self>
    where
        N: AsRef<str>,
        T: AsRef<str>,
    {
        let fields = fields
            .iter()
            .map(|(name, token)| {
                FieldType::from_token(token.as_ref())
                    .map(|ft| (name.as_ref().to_string(), ft))
                    .map_err(|e| ArchiveError::InvalidSchema {
                        type_name: type_name.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(type_name, fields, primary_key_index)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn primary_key_index(&self) -> usize {
        self.primary_key_index
    }

    pub fn primary_key_field(&self) -> &FieldDef {
        &self.fields[self.primary_key_index]
    }

    /// Size of an encoded record in bytes.
    pub fn record_width(&self) -> usize {
        self.record_width
    }

    /// Converts an interpreter token into a value for the field at `index`.
    ///
    /// Any token is a valid string. Integer tokens must be decimal; a well
    /// formed integer that does not fit in 64 bits is reported separately.
    pub fn parse_value(&self, index: usize, token: &str) -> Result<Value> {
        let field = &self.fields[index];
        match field.field_type {
            FieldType::String => Ok(Value::String(token.to_string())),
            FieldType::Integer => match token.parse::<i64>() {
                Ok(v) => Ok(Value::Integer(v)),
                Err(_) if looks_like_integer(token) => Err(ArchiveError::IntegerOutOfRange {
                    type_name: self.type_name.clone(),
                    field: field.name.clone(),
                    value: token.to_string(),
                }),
                Err(_) => Err(ArchiveError::FieldTypeMismatch {
                    type_name: self.type_name.clone(),
                    field: field.name.clone(),
                    expected: field.field_type.to_string(),
                    value: token.to_string(),
                }),
            },
        }
    }

    /// Converts a full row of tokens, checking the field count first.
    pub fn parse_values<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<Value>> {
        if tokens.len() != self.fields.len() {
            return Err(ArchiveError::FieldCountMismatch {
                type_name: self.type_name.clone(),
                expected: self.fields.len(),
                actual: tokens.len(),
            });
        }
        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| self.parse_value(i, token.as_ref()))
            .collect()
    }

    /// Serializes the schema as one catalog line.
    /// Format: `type|num_fields|pk_index (1-based)|name:type,name:type,...`
    pub fn serialize(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.field_type.token()))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}|{}|{}|{}",
            self.type_name,
            self.fields.len(),
            self.primary_key_index + 1,
            fields
        )
    }

    /// Parses a catalog line written by [`Schema::serialize`].
    pub fn deserialize(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.trim().split('|').collect();
        let malformed = |reason: &str| ArchiveError::InvalidSchema {
            type_name: parts.first().copied().unwrap_or_default().to_string(),
            reason: reason.to_string(),
        };
        if parts.len() != 4 {
            return Err(malformed("expected 4 '|' separated sections"));
        }

        let num_fields: usize = parts[1]
            .parse()
            .map_err(|_| malformed("field count is not a number"))?;
        let pk_index: usize = parts[2]
            .parse()
            .map_err(|_| malformed("primary key index is not a number"))?;
        if pk_index == 0 {
            return Err(malformed("primary key index is 1-based"));
        }

        let fields = parts[3]
            .split(',')
            .map(|pair| {
                pair.split_once(':')
                    .map(|(name, token)| (name.trim(), token.trim()))
                    .ok_or_else(|| malformed("field entry is not 'name:type'"))
            })
            .collect::<Result<Vec<_>>>()?;
        if fields.len() != num_fields {
            return Err(malformed("field count does not match field list"));
        }

        Self::from_tokens(parts[0], fields.as_slice(), pk_index - 1)
    }
}

/// Names end up in file names and in the catalog's text form, so they may
/// not contain its separators, path separators or whitespace.
fn is_storable_name(name: &str) -> bool {
    const RESERVED: &[char] = &['|', ',', ':', '/', '\\'];
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| RESERVED.contains(&c) || c.is_whitespace() || c.is_control())
}

fn looks_like_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
