//! Control functions.

use crate::error::{ScriptError, ScriptResult};
use crate::functions::{expect_str, FunctionSpec, Params};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::Value;

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![FunctionSpec::new(
        "throw",
        Params::Fixed(vec![TypeExpr::String]),
        ReturnSpec::Never,
        throw,
    )]
}

/// Raise a user-thrown runtime error carrying the given message.
fn throw(args: &[Value]) -> ScriptResult<Value> {
    Err(ScriptError::UserThrown(
        expect_str("throw", args, 0)?.to_string(),
    ))
}
