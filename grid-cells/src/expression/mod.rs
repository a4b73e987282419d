//! Expression evaluation against records
//!
//! [`build_context`] turns a record into variables; an [`ExpressionEngine`]
//! compiles and evaluates expression text against them. [`LuaEngine`] is the
//! bundled engine.

mod context;
mod engine;
mod lua;

pub use context::{Binding, EvaluationContext, ID_VARIABLE, build_context};
pub use engine::{ExpressionEngine, ExpressionError};
pub use lua::{CompiledLua, LuaEngine};
