//! Grid configuration files
//!
//! A grid file describes one data definition, its fields and the columns to
//! display:
//!
//! ```toml
//! [data_definition]
//! name = "order"
//! message_prefix = "orders.order"
//!
//! [[fields]]
//! name = "state"
//! type = "enum"
//!
//! [[columns]]
//! name = "state"
//! fields = ["state"]
//!
//! [[columns]]
//! name = "summary"
//! expression = "number .. ' / ' .. product.name"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{ColumnDefinition, ColumnError, DataDefinition, FieldDefinition, FieldType};

/// A field entry of a grid file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
}

/// A column entry of a grid file; `fields` refers to field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// Contents of a grid file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub data_definition: DataDefinition,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

/// Error turning a grid file into column definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A column names a field that is not declared
    UnknownField { column: String, field: String },
    /// A field is declared twice
    DuplicateField { field: String },
    /// A column cannot be rendered
    Column(ColumnError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownField { column, field } => write!(
                f,
                "column '{}' refers to unknown field '{}'",
                column, field
            ),
            ConfigError::DuplicateField { field } => {
                write!(f, "field '{}' is declared more than once", field)
            }
            ConfigError::Column(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ColumnError> for ConfigError {
    fn from(e: ColumnError) -> Self {
        ConfigError::Column(e)
    }
}

impl GridConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse grid configuration")
    }

    /// Load and validate a grid file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grid file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid grid file: {}", path.display()))?;

        config
            .columns()
            .with_context(|| format!("Invalid columns in grid file: {}", path.display()))?;

        log::debug!(
            "Loaded grid '{}' with {} fields and {} columns",
            config.data_definition.name,
            config.fields.len(),
            config.columns.len()
        );
        Ok(config)
    }

    /// Declared fields bound to this grid's data definition
    pub fn field_definitions(&self) -> Result<Vec<FieldDefinition>, ConfigError> {
        let mut definitions: Vec<FieldDefinition> = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if definitions.iter().any(|d| d.name == field.name) {
                return Err(ConfigError::DuplicateField {
                    field: field.name.clone(),
                });
            }
            definitions.push(FieldDefinition::new(
                field.name.as_str(),
                field.field_type.clone(),
                self.data_definition.clone(),
            ));
        }
        Ok(definitions)
    }

    /// Column definitions in file order, validated
    pub fn columns(&self) -> Result<Vec<ColumnDefinition>, ConfigError> {
        let fields = self.field_definitions()?;

        self.columns
            .iter()
            .map(|column| {
                let column_fields = column
                    .fields
                    .iter()
                    .map(|name| {
                        fields
                            .iter()
                            .find(|f| &f.name == name)
                            .cloned()
                            .ok_or_else(|| ConfigError::UnknownField {
                                column: column.name.clone(),
                                field: name.clone(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let definition = ColumnDefinition {
                    name: column.name.clone(),
                    expression: column.expression.clone(),
                    fields: column_fields,
                };
                definition.validate()?;
                Ok(definition)
            })
            .collect()
    }

    /// Column names in file order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::LuaEngine;
    use crate::model::{Entity, Record};
    use crate::resolve::Resolver;
    use crate::translation::{Locale, MessageCatalog};
    use std::sync::Arc;

    const GRID: &str = r#"
        [data_definition]
        name = "order"
        message_prefix = "orders.order"

        [[fields]]
        name = "number"
        type = "string"

        [[fields]]
        name = "state"
        type = "enum"

        [[fields]]
        name = "amount"
        type = "decimal"

        [[fields]]
        name = "product"
        type = "belongs_to"
        display_field = "name"

        [[columns]]
        name = "state"
        fields = ["state"]

        [[columns]]
        name = "numbers"
        fields = ["number", "amount"]

        [[columns]]
        name = "summary"
        expression = "number .. ' / ' .. product.name"
    "#;

    #[test]
    fn test_parse_grid() {
        let config = GridConfig::from_toml_str(GRID).unwrap();
        assert_eq!(config.data_definition.name, "order");
        assert_eq!(config.fields.len(), 4);
        assert_eq!(config.fields[1].field_type, FieldType::Enum);
        assert_eq!(config.fields[2].field_type, FieldType::Decimal { scale: 2 });
        assert_eq!(config.column_names(), vec!["state", "numbers", "summary"]);
    }

    #[test]
    fn test_columns_resolve_field_definitions() {
        let config = GridConfig::from_toml_str(GRID).unwrap();
        let columns = config.columns().unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].fields[0].base_message_code(), "orders.order.state");
        assert_eq!(columns[1].fields.len(), 2);
        assert!(columns[2].has_expression());
        assert!(columns[2].fields.is_empty());
    }

    #[test]
    fn test_unknown_field() {
        let mut config = GridConfig::from_toml_str(GRID).unwrap();
        config.columns[0].fields = vec!["nope".into()];

        assert_eq!(
            config.columns(),
            Err(ConfigError::UnknownField {
                column: "state".into(),
                field: "nope".into()
            })
        );
    }

    #[test]
    fn test_column_without_source() {
        let mut config = GridConfig::from_toml_str(GRID).unwrap();
        config.columns.push(ColumnConfig {
            name: "blank".into(),
            expression: Some(String::new()),
            fields: vec![],
        });

        assert!(matches!(config.columns(), Err(ConfigError::Column(_))));
    }

    #[test]
    fn test_duplicate_field() {
        let mut config = GridConfig::from_toml_str(GRID).unwrap();
        config.fields.push(config.fields[0].clone());

        assert_eq!(
            config.field_definitions(),
            Err(ConfigError::DuplicateField {
                field: "number".into()
            })
        );
    }

    #[test]
    fn test_unknown_field_type() {
        let content = r#"
            [data_definition]
            name = "order"

            [[fields]]
            name = "x"
            type = "hologram"
        "#;
        assert!(GridConfig::from_toml_str(content).is_err());
    }

    #[test]
    fn test_demo_grid_end_to_end() {
        let config = GridConfig::from_toml_str(include_str!("../../../demos/orders.toml")).unwrap();
        let catalog =
            MessageCatalog::from_toml_str(include_str!("../../../demos/messages.toml")).unwrap();
        let records: serde_json::Value =
            serde_json::from_str(include_str!("../../../demos/orders.json")).unwrap();
        let entities: Vec<Entity> = records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| Entity::from_json("order", r))
            .collect();

        let resolver = Resolver::new(LuaEngine::new(), Arc::new(catalog));
        let rows = resolver
            .resolve_rows(
                entities.iter().map(|e| e as &dyn Record),
                &config.columns().unwrap(),
                &Locale::new("pl-PL"),
            )
            .unwrap();

        let text = |row: &[Option<String>]| {
            row.iter()
                .map(|c| c.clone().unwrap_or_default())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            text(&rows[0][..]),
            vec!["ORD-1", "Oczekuje", "Nie", "Bolt, 120.50, 2024-03-01", "ORD-1 (Bolt #7)"]
        );
        assert_eq!(
            text(&rows[1][..]),
            vec!["ORD-2", "Zrealizowane", "Tak", "Nut, 80.00, ", "ORD-2 (Nut #8)"]
        );
    }
}
