//! Conditional functions.

use crate::error::ScriptResult;
use crate::functions::{expect_any, expect_bool, FunctionSpec, Params};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::Value;

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![FunctionSpec::new(
        "if",
        Params::Fixed(vec![TypeExpr::Boolean, TypeExpr::Any, TypeExpr::Any]),
        ReturnSpec::FromArgs(vec![1, 2]),
        if_,
    )]
}

/// Conditional `if` statement that returns the `true` or `false` parameter
/// depending on the `condition` value. Both branches are evaluated; only the
/// chosen one is returned.
fn if_(args: &[Value]) -> ScriptResult<Value> {
    let condition = expect_bool("if", args, 0)?;
    let chosen = if condition { 1 } else { 2 };
    Ok(expect_any("if", args, chosen)?.clone())
}
