//! The common error hierarchy shared by the parser, type checker, resolver
//! and evaluator.

use thiserror::Error;

pub type ScriptResult<T> = Result<T, ScriptError>;

/// Every failure mode of the engine, as one closed set of variants.
///
/// All phases surface errors through this type so hosts can match on the kind
/// without caring which phase produced it. Messages are human-readable
/// one-liners; the host chooses where to log them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// Malformed format string: unbalanced braces, bad tokens, numeric- or
    /// string-only argument violations.
    #[error("invalid syntax at position {pos}: {message}")]
    InvalidSyntax { message: String, pos: usize },

    /// A built-in call whose argument types fail the compatibility check.
    #[error("Invalid arguments passed to function {name}.\nExpected {expected}.\nReceived {received}")]
    IncompatibleFunctionArguments {
        name: String,
        expected: String,
        received: String,
    },

    /// A call to a name that is neither registered nor a custom function.
    #[error("Function name {name} does not exist")]
    FunctionDoesNotExist { name: String },

    /// Resolver-level failure: dependency cycle, custom-function arity
    /// mismatch, or a definition-shape violation.
    #[error("{0}")]
    StringFormatting(String),

    /// `%map_get` with a missing key and no default.
    #[error("{0}")]
    KeyDoesNotExist(String),

    /// `%array_index` with a value not present in the array.
    #[error("{0}")]
    ArrayValueDoesNotExist(String),

    /// A built-in raised an error while executing.
    #[error("Runtime error occurred when executing the function %{function}: {message}")]
    FunctionRuntime { function: String, message: String },

    /// Raised by `%throw`; carries the user's message unchanged.
    #[error("{0}")]
    UserThrown(String),
}

impl ScriptError {
    /// Shorthand for [`ScriptError::FunctionRuntime`], for use inside
    /// built-in and host-registered function handlers.
    pub fn runtime(function: &str, message: impl Into<String>) -> Self {
        Self::FunctionRuntime {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
