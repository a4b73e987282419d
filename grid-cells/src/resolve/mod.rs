//! Cell value resolution
//!
//! A column is resolved either by evaluating its expression against the
//! record or by rendering its fields. Both paths end in [`normalize`], the one
//! place where "nothing to display" is decided.

use std::sync::Arc;

use crate::expression::{ExpressionEngine, ExpressionError, build_context};
use crate::model::{ColumnDefinition, FieldDefinition, Record};
use crate::translation::{FALSE_MESSAGE, Locale, TRUE_MESSAGE, TranslationService};

/// Separator between the values of a multi-field column
pub const FIELD_SEPARATOR: &str = ", ";

/// Text rendered for `false` booleans
const FALSE_TOKEN: &str = "0";

/// Text treated as "no value"
const NULL_TOKEN: &str = "null";

/// Error resolving a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// An expression was required but the text is empty
    EmptyExpression,
    /// A column without an expression has no fields to render
    NoFields { column: String },
    /// The expression failed to compile or evaluate
    Expression(ExpressionError),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::EmptyExpression => write!(f, "expression must be defined"),
            ResolveError::NoFields { column } => write!(
                f,
                "column '{}' has no expression and no fields to display",
                column
            ),
            ResolveError::Expression(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Expression(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExpressionError> for ResolveError {
    fn from(e: ExpressionError) -> Self {
        ResolveError::Expression(e)
    }
}

/// Collapse empty text and the literal `"null"` to no value
///
/// Exact, case-sensitive match: `"NULL"` and `"0"` are values.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    match raw {
        None | Some("") | Some(NULL_TOKEN) => None,
        Some(text) => Some(text.to_string()),
    }
}

/// Text form of an expression result; the language's null becomes `"null"`
pub fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => NULL_TOKEN.to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Resolves display text for grid cells
///
/// Holds the expression engine and the translation service; keeps no state
/// between calls.
pub struct Resolver<E, T: ?Sized> {
    engine: E,
    translations: Arc<T>,
}

impl<E, T> Resolver<E, T>
where
    E: ExpressionEngine,
    T: TranslationService + ?Sized,
{
    pub fn new(engine: E, translations: Arc<T>) -> Self {
        Self {
            engine,
            translations,
        }
    }

    /// Text to display for a column of a record, `None` when there is none
    ///
    /// Evaluates the column's expression when it has a non-empty one,
    /// otherwise renders its fields.
    pub fn resolve(
        &self,
        entity: Option<&dyn Record>,
        column: &ColumnDefinition,
        locale: &Locale,
    ) -> Result<Option<String>, ResolveError> {
        let value = match column.active_expression() {
            Some(expression) => self.value_with_expression(entity, expression)?,
            None => self.value_without_expression(entity, column, locale)?,
        };

        Ok(normalize(Some(&value)))
    }

    /// Evaluate an expression against a record, `None` when the result is empty
    pub fn resolve_expression(
        &self,
        entity: Option<&dyn Record>,
        expression: &str,
    ) -> Result<Option<String>, ResolveError> {
        if expression.is_empty() {
            return Err(ResolveError::EmptyExpression);
        }

        let value = self.value_with_expression(entity, expression)?;
        Ok(normalize(Some(&value)))
    }

    /// Resolve every column of one row
    pub fn resolve_row(
        &self,
        entity: Option<&dyn Record>,
        columns: &[ColumnDefinition],
        locale: &Locale,
    ) -> Result<Vec<Option<String>>, ResolveError> {
        columns
            .iter()
            .map(|column| self.resolve(entity, column, locale))
            .collect()
    }

    /// Resolve every column of every row, stopping at the first failure
    pub fn resolve_rows<'r, I>(
        &self,
        entities: I,
        columns: &[ColumnDefinition],
        locale: &Locale,
    ) -> Result<Vec<Vec<Option<String>>>, ResolveError>
    where
        I: IntoIterator<Item = &'r dyn Record>,
    {
        entities
            .into_iter()
            .enumerate()
            .map(|(row, entity)| {
                self.resolve_row(Some(entity), columns, locale)
                    .inspect_err(|e| log::error!("Failed to resolve row {}: {}", row, e))
            })
            .collect()
    }

    fn value_with_expression(
        &self,
        entity: Option<&dyn Record>,
        expression: &str,
    ) -> Result<String, ResolveError> {
        let compiled = self.engine.compile(expression)?;
        let context = build_context(entity);
        let value = stringify(&self.engine.evaluate(&compiled, &context)?);

        log::debug!(
            "Calculating value of expression \"{}\" for {} : {}",
            expression,
            describe(entity),
            value
        );

        Ok(value)
    }

    fn value_without_expression(
        &self,
        entity: Option<&dyn Record>,
        column: &ColumnDefinition,
        locale: &Locale,
    ) -> Result<String, ResolveError> {
        let value = match column.fields.as_slice() {
            [] => {
                return Err(ResolveError::NoFields {
                    column: column.name.clone(),
                });
            }
            [field] => self.single_field_value(entity, field, locale),
            fields => fields
                .iter()
                .map(|field| render_field(entity, field))
                .collect::<Vec<_>>()
                .join(FIELD_SEPARATOR),
        };

        log::debug!(
            "Calculating value of column {} for {} : {}",
            column.name,
            describe(entity),
            value
        );

        Ok(value)
    }

    /// Rendered value of a lone field, with boolean and enum labels translated
    fn single_field_value(
        &self,
        entity: Option<&dyn Record>,
        field: &FieldDefinition,
        locale: &Locale,
    ) -> String {
        let value = render_field(entity, field);

        if field.is_boolean() {
            let key = if value == FALSE_TOKEN {
                FALSE_MESSAGE
            } else {
                TRUE_MESSAGE
            };
            self.translations.translate(key, locale)
        } else if field.is_enum() {
            let key = format!("{}.value.{}", field.base_message_code(), value);
            self.translations.translate(&key, locale)
        } else {
            value
        }
    }
}

/// Short form of a record for trace lines
fn describe(entity: Option<&dyn Record>) -> String {
    match entity {
        Some(record) => format!("record[id={}]", record.id()),
        None => "no record".to_string(),
    }
}

fn render_field(entity: Option<&dyn Record>, field: &FieldDefinition) -> String {
    let raw = entity.and_then(|e| e.field(&field.name));
    field.render(raw.as_ref())
}
