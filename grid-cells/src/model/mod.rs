//! Records, field definitions and column definitions consumed by the resolver

mod column;
mod entity;
mod field;
mod value;

pub use column::{ColumnDefinition, ColumnError};
pub use entity::{Entity, EntityField, FieldRef, Record};
pub use field::{DataDefinition, FieldDefinition, FieldType};
pub use value::Value;
