//! Records and the read-only capability the resolver needs from them

use std::collections::BTreeMap;

use super::Value;

/// A readable record: identity, ordered field names and lookup by name
///
/// The resolver never mutates or owns records; anything that can answer these
/// three questions can be rendered in a grid.
pub trait Record: std::fmt::Debug {
    /// Identity of the record (`Value::Null` when it has none yet)
    fn id(&self) -> Value;

    /// Field names in a stable order
    fn field_names(&self) -> Vec<&str>;

    /// Raw value of a field, `None` when the record has no such field
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;
}

/// A raw field value borrowed from a record
#[derive(Debug, Clone)]
pub enum FieldRef<'a> {
    /// Scalar value
    Value(Value),
    /// To-one relation
    Record(&'a dyn Record),
    /// To-many relation
    Records(Vec<&'a dyn Record>),
}

impl FieldRef<'_> {
    /// Get the scalar value, if this is one
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldRef::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// A field stored on an owned [`Entity`]
#[derive(Debug, Clone, PartialEq)]
pub enum EntityField {
    Value(Value),
    Entity(Entity),
    Entities(Vec<Entity>),
}

impl From<Value> for EntityField {
    fn from(value: Value) -> Self {
        EntityField::Value(value)
    }
}

impl From<Entity> for EntityField {
    fn from(entity: Entity) -> Self {
        EntityField::Entity(entity)
    }
}

impl From<Vec<Entity>> for EntityField {
    fn from(entities: Vec<Entity>) -> Self {
        EntityField::Entities(entities)
    }
}

/// An owned, in-memory record
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Logical name of the entity type (e.g., "order")
    pub name: String,
    /// Identity of this record
    pub id: Value,
    fields: BTreeMap<String, EntityField>,
}

impl Entity {
    /// Create an empty entity
    pub fn new(name: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<EntityField>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field value, replacing any previous one
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<EntityField>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Build an entity from a JSON object
    ///
    /// Objects become nested entities and arrays of objects become to-many
    /// relations. The identity is taken from `"id"` or `"<name>id"` (the
    /// Dataverse primary key convention); a nested entity is named after the
    /// field holding it, so `"product": {"productid": 7}` has identity 7.
    pub fn from_json(name: &str, json: &serde_json::Value) -> Self {
        let Some(obj) = json.as_object() else {
            return Entity::new(name, Value::Null);
        };

        let id = obj
            .get("id")
            .or_else(|| obj.get(&format!("{}id", name)))
            .map(Value::from_json)
            .unwrap_or_default();

        let mut entity = Entity::new(name, id);
        for (key, val) in obj {
            if key == "id" {
                continue;
            }
            entity.set(key.as_str(), field_from_json(key, val));
        }
        entity
    }
}

fn field_from_json(key: &str, json: &serde_json::Value) -> EntityField {
    match json {
        serde_json::Value::Object(_) => EntityField::Entity(Entity::from_json(key, json)),
        serde_json::Value::Array(items) if items.iter().all(|i| i.is_object()) => {
            EntityField::Entities(items.iter().map(|i| Entity::from_json(key, i)).collect())
        }
        _ => EntityField::Value(Value::from_json(json)),
    }
}

impl Record for Entity {
    fn id(&self) -> Value {
        self.id.clone()
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        self.fields.get(name).map(|field| match field {
            EntityField::Value(v) => FieldRef::Value(v.clone()),
            EntityField::Entity(e) => FieldRef::Record(e),
            EntityField::Entities(list) => {
                FieldRef::Records(list.iter().map(|e| e as &dyn Record).collect())
            }
        })
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[id={}]", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_are_sorted() {
        let entity = Entity::new("order", 1i64)
            .with("number", Value::from("ORD-1"))
            .with("amount", Value::Int(3));

        assert_eq!(entity.field_names(), vec!["amount", "number"]);
    }

    #[test]
    fn test_from_json_identity_and_nesting() {
        let record = json!({
            "orderid": 10,
            "number": "ORD-10",
            "product": { "id": 7, "name": "Bolt" },
            "lines": [ { "id": 1, "qty": 2 }, { "id": 2, "qty": 5 } ],
            "tags": ["a", "b"]
        });

        let entity = Entity::from_json("order", &record);
        assert_eq!(entity.id, Value::Int(10));

        match entity.field("product") {
            Some(FieldRef::Record(product)) => {
                assert_eq!(product.id(), Value::Int(7));
                assert_eq!(
                    product.field("name").and_then(|f| f.as_value().cloned()),
                    Some(Value::String("Bolt".into()))
                );
            }
            other => panic!("expected nested record, got {:?}", other),
        }

        match entity.field("lines") {
            Some(FieldRef::Records(lines)) => assert_eq!(lines.len(), 2),
            other => panic!("expected collection, got {:?}", other),
        }

        assert_eq!(
            entity.field("tags").and_then(|f| f.as_value().cloned()),
            Some(Value::String(r#"["a","b"]"#.into()))
        );
    }

    #[test]
    fn test_from_json_nested_identity_uses_field_name() {
        let record = json!({
            "id": 1,
            "product": { "productid": 7, "name": "Bolt" },
            "owner": { "id": 3, "ownerid": 4 }
        });

        let entity = Entity::from_json("order", &record);
        match entity.field("product") {
            Some(FieldRef::Record(product)) => assert_eq!(product.id(), Value::Int(7)),
            other => panic!("expected nested record, got {:?}", other),
        }
        match entity.field("owner") {
            Some(FieldRef::Record(owner)) => assert_eq!(owner.id(), Value::Int(3)),
            other => panic!("expected nested record, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_keeps_text_verbatim() {
        let record = json!({
            "id": 1,
            "code": "ABCDEF01-2345-6789-ABCD-EF0123456789",
            "stamp": "2024-03-01T10:30:00Z"
        });

        let entity = Entity::from_json("order", &record);
        assert_eq!(
            entity.field("code").and_then(|f| f.as_value().cloned()),
            Some(Value::String("ABCDEF01-2345-6789-ABCD-EF0123456789".into()))
        );
        assert_eq!(
            entity.field("stamp").and_then(|f| f.as_value().cloned()),
            Some(Value::String("2024-03-01T10:30:00Z".into()))
        );
    }

    #[test]
    fn test_missing_field() {
        let entity = Entity::new("order", Value::Null);
        assert!(entity.field("missing").is_none());
    }
}
