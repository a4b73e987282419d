//! Column definitions: an expression or the fields to display

use super::FieldDefinition;

/// How one grid column derives its text
///
/// A non-empty expression wins; otherwise the fields are rendered, so a column
/// without an expression must name at least one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub expression: Option<String>,
    pub fields: Vec<FieldDefinition>,
}

/// Error when a column definition cannot be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnError {
    /// No expression and no fields
    NoSource { column: String },
}

impl std::fmt::Display for ColumnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnError::NoSource { column } => write!(
                f,
                "column '{}' has neither an expression nor any fields",
                column
            ),
        }
    }
}

impl std::error::Error for ColumnError {}

impl ColumnDefinition {
    /// Column rendering the given fields
    pub fn fields(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            expression: None,
            fields,
        }
    }

    /// Column evaluating an expression
    pub fn expression(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: Some(expression.into()),
            fields: Vec::new(),
        }
    }

    /// The expression, if present and non-empty
    pub fn active_expression(&self) -> Option<&str> {
        self.expression.as_deref().filter(|e| !e.is_empty())
    }

    pub fn has_expression(&self) -> bool {
        self.active_expression().is_some()
    }

    /// Check that the column has something to render
    pub fn validate(&self) -> Result<(), ColumnError> {
        if !self.has_expression() && self.fields.is_empty() {
            return Err(ColumnError::NoSource {
                column: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataDefinition, FieldType};

    #[test]
    fn test_empty_expression_is_not_an_expression() {
        let column = ColumnDefinition {
            name: "number".into(),
            expression: Some(String::new()),
            fields: vec![FieldDefinition::new(
                "number",
                FieldType::String,
                DataDefinition::new("order"),
            )],
        };
        assert!(!column.has_expression());
        assert!(column.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_a_source() {
        let column = ColumnDefinition {
            name: "broken".into(),
            expression: Some(String::new()),
            fields: vec![],
        };
        assert_eq!(
            column.validate(),
            Err(ColumnError::NoSource {
                column: "broken".into()
            })
        );

        assert!(ColumnDefinition::expression("sum", "a + b").validate().is_ok());
    }
}
