//! Field definitions: declared type, owning schema and display rendering

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{FieldRef, Value};

/// The schema (data definition) a field belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDefinition {
    /// Logical name of the entity type (e.g., "order")
    pub name: String,
    /// Prefix of all message keys for this schema (e.g., "orders.order")
    ///
    /// Defaults to the logical name when not configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_prefix: Option<String>,
}

impl DataDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_prefix: None,
        }
    }

    pub fn with_message_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.message_prefix = Some(prefix.into());
        self
    }

    /// Base message key of a field of this schema: `<prefix>.<field>`
    pub fn field_message_code(&self, field: &str) -> String {
        let prefix = self.message_prefix.as_deref().unwrap_or(&self.name);
        format!("{}.{}", prefix, field)
    }
}

/// Declared type of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Text,
    Integer,
    Decimal {
        #[serde(default = "default_scale")]
        scale: usize,
    },
    Boolean,
    Date,
    #[serde(alias = "datetime")]
    DateTime,
    /// Enumerated value, labelled through `<field code>.value.<raw>` messages
    Enum,
    /// To-one relation rendered through one field of the referenced record
    BelongsTo { display_field: String },
    /// To-many relation (not rendered)
    HasMany,
    /// Any other type, rendered as its natural text
    Other { kind: String },
}

fn default_scale() -> usize {
    2
}

/// RFC 3339 timestamp or bare `YYYY-MM-DD` date, in UTC
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl FieldType {
    /// Render a non-null scalar according to this type
    fn render_value(&self, value: &Value) -> String {
        let parsed;
        let value = match (self, value) {
            (FieldType::Date | FieldType::DateTime, Value::String(s)) => match parse_timestamp(s) {
                Some(dt) => {
                    parsed = Value::DateTime(dt);
                    &parsed
                }
                None => value,
            },
            _ => value,
        };

        match (self, value) {
            (FieldType::Boolean, Value::Bool(b)) => (if *b { "1" } else { "0" }).to_string(),
            (FieldType::Boolean, Value::String(s)) => match s.as_str() {
                "false" | "0" => "0".to_string(),
                _ => "1".to_string(),
            },
            (FieldType::Boolean, Value::Int(i)) => (if *i == 0 { "0" } else { "1" }).to_string(),
            (FieldType::Decimal { scale }, v) => match v.as_float() {
                Some(f) => format!("{:.*}", *scale, f),
                None => v.to_string(),
            },
            (FieldType::Integer, Value::Float(f)) => format!("{}", f.trunc() as i64),
            (FieldType::Date, Value::DateTime(dt)) => dt.format("%Y-%m-%d").to_string(),
            (FieldType::DateTime, Value::DateTime(dt)) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            (_, v) => v.to_string(),
        }
    }
}

/// One named field of a data definition
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub data_definition: DataDefinition,
}

impl FieldDefinition {
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        data_definition: DataDefinition,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            data_definition,
        }
    }

    /// Render a raw field value as display text
    ///
    /// Total over its input: a missing field or a null value renders as an
    /// empty string.
    pub fn render(&self, raw: Option<&FieldRef<'_>>) -> String {
        match raw {
            None => String::new(),
            Some(FieldRef::Value(Value::Null)) => String::new(),
            Some(FieldRef::Value(v)) => self.field_type.render_value(v),
            Some(FieldRef::Record(record)) => match &self.field_type {
                FieldType::BelongsTo { display_field } => record
                    .field(display_field)
                    .map(|f| match f {
                        FieldRef::Value(Value::Null) => String::new(),
                        FieldRef::Value(v) => v.to_string(),
                        _ => String::new(),
                    })
                    .unwrap_or_default(),
                _ => match record.id() {
                    Value::Null => String::new(),
                    id => id.to_string(),
                },
            },
            Some(FieldRef::Records(_)) => String::new(),
        }
    }

    /// Base message key for this field (e.g., "orders.order.state")
    pub fn base_message_code(&self) -> String {
        self.data_definition.field_message_code(&self.name)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.field_type, FieldType::Boolean)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.field_type, FieldType::Enum)
    }
}
