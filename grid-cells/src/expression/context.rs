//! Evaluation context built from a record graph

use std::collections::BTreeMap;

use crate::model::{FieldRef, Record, Value};

/// Reserved variable holding a record's identity
pub const ID_VARIABLE: &str = "id";

/// A variable bound in an evaluation context
#[derive(Debug, Clone)]
pub enum Binding<'a> {
    /// Scalar value
    Value(Value),
    /// Flattened to-one relation: field name -> binding, plus `id`
    Fields(BTreeMap<String, Binding<'a>>),
    /// Record nested deeper than one level, bound as-is
    Record(&'a dyn Record),
    /// To-many relation, bound as-is
    Records(Vec<&'a dyn Record>),
}

impl<'a> Binding<'a> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Binding::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_fields(&self) -> Option<&BTreeMap<String, Binding<'a>>> {
        match self {
            Binding::Fields(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Variables visible to one expression evaluation
///
/// Built fresh for every resolution and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext<'a> {
    variables: BTreeMap<String, Binding<'a>>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, binding: Binding<'a>) {
        self.variables.insert(name.into(), binding);
    }

    pub fn get(&self, name: &str) -> Option<&Binding<'a>> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding<'a>)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Build the evaluation context for a record
///
/// The record's identity is bound under [`ID_VARIABLE`] first, then every
/// field by name (so a field literally named `id` shadows the identity).
/// To-one relations are flattened one level into a [`Binding::Fields`] map
/// carrying the related record's own `id`; anything deeper stays opaque.
pub fn build_context(entity: Option<&dyn Record>) -> EvaluationContext<'_> {
    let mut context = EvaluationContext::new();

    let Some(entity) = entity else {
        return context;
    };

    context.set(ID_VARIABLE, Binding::Value(entity.id()));
    for name in entity.field_names() {
        let binding = match entity.field(name) {
            Some(FieldRef::Record(nested)) => Binding::Fields(flatten(nested)),
            Some(other) => bind(other),
            None => Binding::Value(Value::Null),
        };
        context.set(name, binding);
    }

    context
}

/// Field map of a related record with its identity injected last
fn flatten(record: &dyn Record) -> BTreeMap<String, Binding<'_>> {
    let mut values: BTreeMap<String, Binding<'_>> = record
        .field_names()
        .into_iter()
        .map(|name| {
            let binding = record
                .field(name)
                .map(bind)
                .unwrap_or(Binding::Value(Value::Null));
            (name.to_string(), binding)
        })
        .collect();
    values.insert(ID_VARIABLE.to_string(), Binding::Value(record.id()));
    values
}

fn bind(field: FieldRef<'_>) -> Binding<'_> {
    match field {
        FieldRef::Value(v) => Binding::Value(v),
        FieldRef::Record(r) => Binding::Record(r),
        FieldRef::Records(list) => Binding::Records(list),
    }
}
