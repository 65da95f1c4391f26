//! Boolean and comparison functions.

use std::cmp::Ordering;

use crate::error::{ScriptError, ScriptResult};
use crate::functions::{expect_any, expect_bool, FunctionSpec, Params};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::Value;

pub(super) fn specs() -> Vec<FunctionSpec> {
    let comparison = Params::Fixed(vec![TypeExpr::Any, TypeExpr::Any]);
    let binary = Params::Fixed(vec![TypeExpr::Boolean, TypeExpr::Boolean]);
    vec![
        FunctionSpec::new(
            "bool",
            Params::Fixed(vec![TypeExpr::Any]),
            ReturnSpec::Fixed(TypeExpr::Boolean),
            bool_,
        ),
        FunctionSpec::new(
            "equals",
            comparison.clone(),
            ReturnSpec::Fixed(TypeExpr::Boolean),
            equals,
        ),
        FunctionSpec::new("lt", comparison.clone(), ReturnSpec::Fixed(TypeExpr::Boolean), lt),
        FunctionSpec::new("lte", comparison.clone(), ReturnSpec::Fixed(TypeExpr::Boolean), lte),
        FunctionSpec::new("gt", comparison.clone(), ReturnSpec::Fixed(TypeExpr::Boolean), gt),
        FunctionSpec::new("gte", comparison, ReturnSpec::Fixed(TypeExpr::Boolean), gte),
        FunctionSpec::new("and", binary.clone(), ReturnSpec::Fixed(TypeExpr::Boolean), and_),
        FunctionSpec::new("or", binary.clone(), ReturnSpec::Fixed(TypeExpr::Boolean), or_),
        FunctionSpec::new("xor", binary, ReturnSpec::Fixed(TypeExpr::Boolean), xor),
        FunctionSpec::new(
            "not",
            Params::Fixed(vec![TypeExpr::Boolean]),
            ReturnSpec::Fixed(TypeExpr::Boolean),
            not_,
        ),
    ]
}

/// Cast any value to a Boolean via truthiness.
fn bool_(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(expect_any("bool", args, 0)?.truthy()))
}

/// Returns True if left equals right. False otherwise.
fn equals(args: &[Value]) -> ScriptResult<Value> {
    let left = expect_any("equals", args, 0)?;
    let right = expect_any("equals", args, 1)?;
    Ok(Value::Boolean(left.loose_eq(right)))
}

fn ordering(function: &str, args: &[Value]) -> ScriptResult<Ordering> {
    let left = expect_any(function, args, 0)?;
    let right = expect_any(function, args, 1)?;
    left.compare(right).ok_or_else(|| {
        ScriptError::runtime(
            function,
            format!(
                "cannot order {} and {}",
                left.type_name(),
                right.type_name()
            ),
        )
    })
}

fn lt(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(ordering("lt", args)? == Ordering::Less))
}

fn lte(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(ordering("lte", args)? != Ordering::Greater))
}

fn gt(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(ordering("gt", args)? == Ordering::Greater))
}

fn gte(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(ordering("gte", args)? != Ordering::Less))
}

fn and_(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(
        expect_bool("and", args, 0)? && expect_bool("and", args, 1)?,
    ))
}

fn or_(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(
        expect_bool("or", args, 0)? || expect_bool("or", args, 1)?,
    ))
}

fn xor(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(
        expect_bool("xor", args, 0)? ^ expect_bool("xor", args, 1)?,
    ))
}

fn not_(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::Boolean(!expect_bool("not", args, 0)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_coerces_numerics() {
        let out = equals(&[Value::from(1), Value::from(1.0)]).unwrap();
        assert_eq!(out, Value::from(true));
    }

    #[test]
    fn comparisons_error_across_kinds() {
        assert!(lt(&[Value::from("a"), Value::from(1)]).is_err());
        assert_eq!(
            lt(&[Value::from("a"), Value::from("b")]).unwrap(),
            Value::from(true)
        );
    }

    #[test]
    fn bool_cast_uses_truthiness() {
        assert_eq!(bool_(&[Value::from("")]).unwrap(), Value::from(false));
        assert_eq!(bool_(&[Value::from(2)]).unwrap(), Value::from(true));
    }
}
