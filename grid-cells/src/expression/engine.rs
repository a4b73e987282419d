//! The narrow interface the resolver uses to run expressions

use super::EvaluationContext;

/// Error compiling or evaluating an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    /// The expression text is not valid
    Compile { expression: String, message: String },
    /// The expression failed while running (undefined variable, type error, ...)
    Evaluation { expression: String, message: String },
    /// The interpreter itself could not be set up
    Runtime(String),
}

impl std::fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionError::Compile {
                expression,
                message,
            } => write!(f, "failed to compile expression \"{}\": {}", expression, message),
            ExpressionError::Evaluation {
                expression,
                message,
            } => write!(f, "failed to evaluate expression \"{}\": {}", expression, message),
            ExpressionError::Runtime(message) => {
                write!(f, "expression runtime unavailable: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpressionError {}

/// An embedded expression language
///
/// Implementations compile source text once and evaluate the compiled form
/// against a context. Evaluation must not keep any state between calls.
pub trait ExpressionEngine {
    /// Compiled form of an expression
    type Compiled;

    fn compile(&self, source: &str) -> Result<Self::Compiled, ExpressionError>;

    /// Evaluate against the context; the language's null is `serde_json::Value::Null`
    fn evaluate(
        &self,
        compiled: &Self::Compiled,
        context: &EvaluationContext<'_>,
    ) -> Result<serde_json::Value, ExpressionError>;
}
