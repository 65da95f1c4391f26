//! Array functions.

use crate::error::{ScriptError, ScriptResult};
use crate::functions::{expect_any, expect_array, expect_i64, FunctionSpec, Params};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::Value;

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec::new(
            "array_extend",
            Params::Variadic(TypeExpr::Array),
            ReturnSpec::Fixed(TypeExpr::Array),
            array_extend,
        ),
        FunctionSpec::new(
            "array_at",
            Params::Fixed(vec![TypeExpr::Array, TypeExpr::Integer]),
            ReturnSpec::Fixed(TypeExpr::Any),
            array_at,
        ),
        FunctionSpec::new(
            "array_contains",
            Params::Fixed(vec![TypeExpr::Array, TypeExpr::Any]),
            ReturnSpec::Fixed(TypeExpr::Boolean),
            array_contains,
        ),
        FunctionSpec::new(
            "array_index",
            Params::Fixed(vec![TypeExpr::Array, TypeExpr::Any]),
            ReturnSpec::Fixed(TypeExpr::Integer),
            array_index,
        ),
        FunctionSpec::new(
            "array_slice",
            Params::Fixed(vec![
                TypeExpr::Array,
                TypeExpr::Integer,
                TypeExpr::Optional(Box::new(TypeExpr::Integer)),
            ]),
            ReturnSpec::Fixed(TypeExpr::Array),
            array_slice,
        ),
        FunctionSpec::new(
            "array_flatten",
            Params::Fixed(vec![TypeExpr::Array]),
            ReturnSpec::Fixed(TypeExpr::Array),
            array_flatten,
        ),
        FunctionSpec::new(
            "array_reverse",
            Params::Fixed(vec![TypeExpr::Array]),
            ReturnSpec::Fixed(TypeExpr::Array),
            array_reverse,
        ),
        FunctionSpec::new(
            "array_apply",
            Params::Fixed(vec![TypeExpr::Array, TypeExpr::Lambda(1)]),
            ReturnSpec::Fixed(TypeExpr::Array),
            array_apply,
        ),
        FunctionSpec::new(
            "array_enumerate",
            Params::Fixed(vec![TypeExpr::Array, TypeExpr::Lambda(2)]),
            ReturnSpec::Fixed(TypeExpr::Array),
            array_enumerate,
        ),
    ]
}

/// Combine multiple Arrays into a single Array.
fn array_extend(args: &[Value]) -> ScriptResult<Value> {
    let mut out = Vec::new();
    for (idx, _) in args.iter().enumerate() {
        out.extend_from_slice(expect_array("array_extend", args, idx)?);
    }
    Ok(Value::array(out))
}

/// Return the element in the Array at index `idx`. Negative indices count
/// from the end.
fn array_at(args: &[Value]) -> ScriptResult<Value> {
    let array = expect_array("array_at", args, 0)?;
    let idx = expect_i64("array_at", args, 1)?;
    let resolved = if idx < 0 {
        idx + array.len() as i64
    } else {
        idx
    };
    usize::try_from(resolved)
        .ok()
        .and_then(|resolved| array.get(resolved))
        .cloned()
        .ok_or_else(|| {
            ScriptError::runtime(
                "array_at",
                format!("index {idx} is out of range for an Array of length {}", array.len()),
            )
        })
}

/// Return True if the value exists in the Array. False otherwise.
fn array_contains(args: &[Value]) -> ScriptResult<Value> {
    let array = expect_array("array_contains", args, 0)?;
    let value = expect_any("array_contains", args, 1)?;
    Ok(Value::Boolean(array.iter().any(|elem| elem.loose_eq(value))))
}

/// Return the index of the value within the Array if it exists. If it does
/// not, it will throw an error.
fn array_index(args: &[Value]) -> ScriptResult<Value> {
    let array = expect_array("array_index", args, 0)?;
    let value = expect_any("array_index", args, 1)?;
    array
        .iter()
        .position(|elem| elem.loose_eq(value))
        .map(|idx| Value::from(idx as i64))
        .ok_or_else(|| {
            ScriptError::ArrayValueDoesNotExist(
                "Tried to get the index of a value in an Array that does not exist".to_string(),
            )
        })
}

fn clamp_index(idx: i64, len: usize) -> usize {
    if idx < 0 {
        len.saturating_sub(idx.unsigned_abs() as usize)
    } else {
        (idx as usize).min(len)
    }
}

/// Returns the slice of the Array. Negative indices count from the end.
fn array_slice(args: &[Value]) -> ScriptResult<Value> {
    let array = expect_array("array_slice", args, 0)?;
    let start = clamp_index(expect_i64("array_slice", args, 1)?, array.len());
    let end = if args.len() > 2 {
        clamp_index(expect_i64("array_slice", args, 2)?, array.len())
    } else {
        array.len()
    };
    if start >= end {
        return Ok(Value::array(Vec::new()));
    }
    Ok(Value::array(array[start..end].to_vec()))
}

/// Flatten any nested Arrays into a single-dimensional Array.
fn array_flatten(args: &[Value]) -> ScriptResult<Value> {
    fn flatten_into(values: &[Value], out: &mut Vec<Value>) {
        for value in values {
            match value {
                Value::Array(nested) => flatten_into(nested, out),
                other => out.push(other.clone()),
            }
        }
    }

    let array = expect_array("array_flatten", args, 0)?;
    let mut out = Vec::with_capacity(array.len());
    flatten_into(array, &mut out);
    Ok(Value::array(out))
}

/// Reverse an Array.
fn array_reverse(args: &[Value]) -> ScriptResult<Value> {
    let array = expect_array("array_reverse", args, 0)?;
    Ok(Value::array(array.iter().rev().cloned().collect()))
}

/// Apply a lambda function on every element in the Array.
///
/// Like every lambda-taking built-in, this returns one argument Array per
/// element; the evaluator synthesizes the lambda calls from them.
fn array_apply(args: &[Value]) -> ScriptResult<Value> {
    let array = expect_array("array_apply", args, 0)?;
    Ok(Value::array(
        array
            .iter()
            .map(|value| Value::array(vec![value.clone()]))
            .collect(),
    ))
}

/// Apply a lambda function on every element in the Array, where each arg
/// passed to the lambda function is `idx, element` as two separate args.
fn array_enumerate(args: &[Value]) -> ScriptResult<Value> {
    let array = expect_array("array_enumerate", args, 0)?;
    Ok(Value::array(
        array
            .iter()
            .enumerate()
            .map(|(idx, value)| Value::array(vec![Value::from(idx as i64), value.clone()]))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(values: Vec<Value>) -> Value {
        Value::array(values)
    }

    #[test]
    fn extend_concatenates_in_order() {
        let out = array_extend(&[
            array(vec![Value::from(1)]),
            array(vec![Value::from(2), Value::from(3)]),
        ])
        .unwrap();
        assert_eq!(
            out,
            array(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
    }

    #[test]
    fn at_wraps_negative_indices_and_errors_out_of_range() {
        let arr = array(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(
            array_at(&[arr.clone(), Value::from(0)]).unwrap(),
            Value::from("a")
        );
        assert_eq!(
            array_at(&[arr.clone(), Value::from(-1)]).unwrap(),
            Value::from("b")
        );
        assert_eq!(
            array_at(&[arr.clone(), Value::from(-2)]).unwrap(),
            Value::from("a")
        );
        assert!(array_at(&[arr.clone(), Value::from(2)]).is_err());
        assert!(array_at(&[arr, Value::from(-3)]).is_err());
    }

    #[test]
    fn index_errors_when_missing() {
        let arr = array(vec![Value::from("dne"), Value::from("key")]);
        assert_eq!(
            array_index(&[arr.clone(), Value::from("key")]).unwrap(),
            Value::from(1)
        );
        assert_eq!(
            array_index(&[arr, Value::from("nope")]),
            Err(ScriptError::ArrayValueDoesNotExist(
                "Tried to get the index of a value in an Array that does not exist".into()
            ))
        );
    }

    #[test]
    fn slice_supports_negative_and_open_ends() {
        let arr = array(vec![
            Value::from(0),
            Value::from(1),
            Value::from(2),
            Value::from(3),
        ]);
        assert_eq!(
            array_slice(&[arr.clone(), Value::from(1)]).unwrap(),
            array(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
        assert_eq!(
            array_slice(&[arr.clone(), Value::from(1), Value::from(-1)]).unwrap(),
            array(vec![Value::from(1), Value::from(2)])
        );
        assert_eq!(
            array_slice(&[arr, Value::from(3), Value::from(1)]).unwrap(),
            array(vec![])
        );
    }

    #[test]
    fn flatten_recurses() {
        let nested = array(vec![
            Value::from(1),
            array(vec![Value::from(2), array(vec![Value::from(3)])]),
        ]);
        assert_eq!(
            array_flatten(&[nested]).unwrap(),
            array(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
    }

    #[test]
    fn apply_produces_singleton_argument_rows() {
        let arr = array(vec![Value::from("a"), Value::from("b")]);
        let rows = array_apply(&[arr, Value::lambda("upper")]).unwrap();
        assert_eq!(
            rows,
            array(vec![
                array(vec![Value::from("a")]),
                array(vec![Value::from("b")]),
            ])
        );
    }

    #[test]
    fn enumerate_produces_indexed_rows() {
        let arr = array(vec![Value::from("a")]);
        let rows = array_enumerate(&[arr, Value::lambda("f")]).unwrap();
        assert_eq!(
            rows,
            array(vec![array(vec![Value::from(0), Value::from("a")])])
        );
    }
}
