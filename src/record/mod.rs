mod codec;
mod field_type;
mod schema;
mod value;

pub use codec::{decode, decode_field, encode};
pub use field_type::FieldType;
pub use schema::{FieldDef, Schema};
pub use value::Value;
