//! Lua expression engine
//!
//! Expressions are Lua 5.4 expressions (`number .. " / " .. product.name`,
//! `amount * 2`, `paid and "yes" or "no"`). Every evaluation runs in a fresh
//! sandboxed interpreter whose globals are the context variables.

use std::collections::HashSet;
use std::ffi::c_void;

use mlua::{Lua, LuaOptions, StdLib, Table, Value as LuaValue};

use super::{Binding, EvaluationContext, ExpressionEngine, ExpressionError, ID_VARIABLE};
use crate::model::{FieldRef, Record, Value};

/// Default interpreter memory limit (16MB - expressions are small)
const DEFAULT_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

/// Records deeper than this are reduced to their identity
const MAX_RECORD_DEPTH: usize = 8;

/// Base library functions that reach the filesystem, stdout or the collector
const REMOVED_GLOBALS: &[&str] = &["dofile", "loadfile", "load", "print", "collectgarbage"];

/// A syntax-checked expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLua {
    source: String,
    chunk: String,
}

/// Sandboxed Lua implementation of [`ExpressionEngine`]
#[derive(Debug, Clone)]
pub struct LuaEngine {
    memory_limit: usize,
}

impl LuaEngine {
    pub fn new() -> Self {
        Self {
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }

    /// Create a Lua state with limited standard libraries (no io, os, debug, etc.)
    fn sandbox(&self) -> Result<Lua, ExpressionError> {
        let lua = Lua::new_with(
            StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8,
            LuaOptions::default(),
        )
        .map_err(|e| ExpressionError::Runtime(e.to_string()))?;

        lua.set_memory_limit(self.memory_limit)
            .map_err(|e| ExpressionError::Runtime(e.to_string()))?;

        // The base library is always opened
        let globals = lua.globals();
        for name in REMOVED_GLOBALS {
            globals
                .raw_set(*name, LuaValue::Nil)
                .map_err(|e| ExpressionError::Runtime(e.to_string()))?;
        }

        Ok(lua)
    }

    /// Build the environment table: context variables, falling back to the
    /// sandbox globals, and an error for anything undeclared
    fn environment(&self, lua: &Lua, context: &EvaluationContext<'_>) -> mlua::Result<Table> {
        let env = lua.create_table()?;
        let mut declared = HashSet::new();

        for (name, binding) in context.iter() {
            env.raw_set(name, binding_to_lua(lua, binding)?)?;
            declared.insert(name.to_string());
        }

        // Declared variables holding null are absent from the table, so they
        // have to be told apart from undefined names here
        let index = lua.create_function(move |lua, (_env, key): (Table, LuaValue)| {
            let global: LuaValue = lua.globals().raw_get(key.clone())?;
            if !global.is_nil() {
                return Ok(global);
            }

            let name = match &key {
                LuaValue::String(s) => s.to_str()?.to_string(),
                other => format!("{:?}", other),
            };
            if declared.contains(&name) {
                return Ok(LuaValue::Nil);
            }

            Err(mlua::Error::runtime(format!("undefined variable '{}'", name)))
        })?;

        let meta = lua.create_table()?;
        meta.set("__index", index)?;
        env.set_metatable(Some(meta));

        Ok(env)
    }
}

impl Default for LuaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEngine for LuaEngine {
    type Compiled = CompiledLua;

    fn compile(&self, source: &str) -> Result<CompiledLua, ExpressionError> {
        let lua = self.sandbox()?;
        let chunk = format!("return {}", source);

        lua.load(chunk.as_str())
            .set_name("expression")
            .into_function()
            .map_err(|e| ExpressionError::Compile {
                expression: source.to_string(),
                message: e.to_string(),
            })?;

        Ok(CompiledLua {
            source: source.to_string(),
            chunk,
        })
    }

    fn evaluate(
        &self,
        compiled: &CompiledLua,
        context: &EvaluationContext<'_>,
    ) -> Result<serde_json::Value, ExpressionError> {
        let evaluation_error = |e: mlua::Error| ExpressionError::Evaluation {
            expression: compiled.source.clone(),
            message: e.to_string(),
        };

        let lua = self.sandbox()?;
        let env = self.environment(&lua, context).map_err(evaluation_error)?;

        let result: LuaValue = lua
            .load(compiled.chunk.as_str())
            .set_name("expression")
            .set_environment(env)
            .eval()
            .map_err(evaluation_error)?;

        lua_to_json(result, &mut HashSet::new()).map_err(evaluation_error)
    }
}

/// Convert a context binding to a Lua value
fn binding_to_lua(lua: &Lua, binding: &Binding<'_>) -> mlua::Result<LuaValue> {
    match binding {
        Binding::Value(v) => value_to_lua(lua, v),
        Binding::Fields(fields) => {
            let table = lua.create_table()?;
            for (name, nested) in fields {
                table.raw_set(name.as_str(), binding_to_lua(lua, nested)?)?;
            }
            Ok(LuaValue::Table(table))
        }
        Binding::Record(record) => record_to_lua(lua, *record, 0),
        Binding::Records(records) => records_to_lua(lua, records, 0),
    }
}

/// Convert a scalar to a Lua value
fn value_to_lua(lua: &Lua, value: &Value) -> mlua::Result<LuaValue> {
    match value {
        Value::Null => Ok(LuaValue::Nil),
        Value::String(s) => Ok(LuaValue::String(lua.create_string(s)?)),
        Value::Int(i) => Ok(LuaValue::Integer(*i)),
        Value::Float(f) => Ok(LuaValue::Number(*f)),
        Value::Bool(b) => Ok(LuaValue::Boolean(*b)),
        Value::DateTime(dt) => Ok(LuaValue::String(lua.create_string(dt.to_rfc3339())?)),
    }
}

/// Convert a record to a table of its fields plus `id`
fn record_to_lua(lua: &Lua, record: &dyn Record, depth: usize) -> mlua::Result<LuaValue> {
    let table = lua.create_table()?;

    if depth < MAX_RECORD_DEPTH {
        for name in record.field_names() {
            let value = match record.field(name) {
                Some(FieldRef::Value(v)) => value_to_lua(lua, &v)?,
                Some(FieldRef::Record(nested)) => record_to_lua(lua, nested, depth + 1)?,
                Some(FieldRef::Records(list)) => records_to_lua(lua, &list, depth + 1)?,
                None => LuaValue::Nil,
            };
            table.raw_set(name, value)?;
        }
    }
    table.raw_set(ID_VARIABLE, value_to_lua(lua, &record.id())?)?;

    Ok(LuaValue::Table(table))
}

fn records_to_lua(lua: &Lua, records: &[&dyn Record], depth: usize) -> mlua::Result<LuaValue> {
    let table = lua.create_table()?;
    for (i, record) in records.iter().enumerate() {
        table.raw_set(i + 1, record_to_lua(lua, *record, depth)?)?;
    }
    Ok(LuaValue::Table(table))
}

/// Convert a Lua result to JSON
///
/// `visiting` holds the tables on the current path; meeting one again is a
/// cycle and fails the evaluation.
fn lua_to_json(
    value: LuaValue,
    visiting: &mut HashSet<*const c_void>,
) -> mlua::Result<serde_json::Value> {
    match value {
        LuaValue::Nil => Ok(serde_json::Value::Null),
        LuaValue::Boolean(b) => Ok(serde_json::Value::Bool(b)),
        LuaValue::Integer(i) => Ok(serde_json::json!(i)),
        LuaValue::Number(n) if !n.is_finite() => {
            Ok(serde_json::Value::String(non_finite_text(n).to_string()))
        }
        LuaValue::Number(n) => Ok(serde_json::json!(n)),
        LuaValue::String(s) => Ok(serde_json::Value::String(s.to_str()?.to_string())),
        LuaValue::Table(t) => {
            let pointer = t.to_pointer();
            if !visiting.insert(pointer) {
                return Err(mlua::Error::runtime("cyclic table"));
            }
            let json = table_to_json(&t, visiting);
            visiting.remove(&pointer);
            json
        }
        _ => Ok(serde_json::Value::Null),
    }
}

fn table_to_json(
    t: &Table,
    visiting: &mut HashSet<*const c_void>,
) -> mlua::Result<serde_json::Value> {
    // Check if it's an array (sequential integer keys starting at 1)
    let len = t.raw_len();
    if len > 0 {
        let mut arr = Vec::with_capacity(len);
        for i in 1..=len {
            arr.push(lua_to_json(t.raw_get::<LuaValue>(i)?, visiting)?);
        }
        return Ok(serde_json::Value::Array(arr));
    }

    let mut obj = serde_json::Map::new();
    for pair in t.clone().pairs::<LuaValue, LuaValue>() {
        let (k, v) = pair?;
        let key = match k {
            LuaValue::String(s) => s.to_str()?.to_string(),
            LuaValue::Integer(i) => i.to_string(),
            _ => continue,
        };
        obj.insert(key, lua_to_json(v, visiting)?);
    }
    Ok(serde_json::Value::Object(obj))
}

/// Lua's spelling of infinities and NaN
fn non_finite_text(n: f64) -> &'static str {
    if n.is_nan() {
        "nan"
    } else if n > 0.0 {
        "inf"
    } else {
        "-inf"
    }
}
