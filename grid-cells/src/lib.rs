//! Display text for grid cells
//!
//! Given a record and a column definition, [`Resolver`] produces the text a
//! grid or report shows for that cell: either the result of the column's
//! expression or the column's fields rendered by type (booleans and enums
//! translated, several fields joined with `", "`). Empty text and the literal
//! `"null"` mean the cell is blank.
//!
//! ```no_run
//! use std::sync::Arc;
//! use grid_cells::{ColumnDefinition, Entity, Locale, LuaEngine, MessageCatalog, Resolver, Value};
//!
//! let resolver = Resolver::new(LuaEngine::new(), Arc::new(MessageCatalog::new()));
//! let order = Entity::new("order", 1i64).with("number", Value::from("ORD-1"));
//! let column = ColumnDefinition::expression("label", "'#' .. number");
//!
//! let text = resolver.resolve(Some(&order), &column, &Locale::default()).unwrap();
//! assert_eq!(text.as_deref(), Some("#ORD-1"));
//! ```

pub mod cli;
pub mod config;
pub mod expression;
pub mod model;
pub mod resolve;
pub mod translation;

pub use config::{ConfigError, GridConfig};
pub use expression::{
    Binding, EvaluationContext, ExpressionEngine, ExpressionError, LuaEngine, build_context,
};
pub use model::{
    ColumnDefinition, DataDefinition, Entity, EntityField, FieldDefinition, FieldRef, FieldType,
    Record, Value,
};
pub use resolve::{ResolveError, Resolver, normalize};
pub use translation::{Locale, MessageCatalog, TranslationService};
