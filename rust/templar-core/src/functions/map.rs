//! Map functions.

use crate::error::{ScriptError, ScriptResult};
use crate::functions::{expect_key, expect_map, FunctionSpec, Params};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::Value;

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec::new(
            "map_get",
            Params::Fixed(vec![
                TypeExpr::Map,
                TypeExpr::Hashable,
                TypeExpr::Optional(Box::new(TypeExpr::Any)),
            ]),
            ReturnSpec::Fixed(TypeExpr::Any),
            map_get,
        ),
        FunctionSpec::new(
            "map_contains",
            Params::Fixed(vec![TypeExpr::Map, TypeExpr::Hashable]),
            ReturnSpec::Fixed(TypeExpr::Boolean),
            map_contains,
        ),
        FunctionSpec::new(
            "map_apply",
            Params::Fixed(vec![TypeExpr::Map, TypeExpr::Lambda(2)]),
            ReturnSpec::Fixed(TypeExpr::Array),
            map_apply,
        ),
        FunctionSpec::new(
            "map_enumerate",
            Params::Fixed(vec![TypeExpr::Map, TypeExpr::Lambda(3)]),
            ReturnSpec::Fixed(TypeExpr::Array),
            map_enumerate,
        ),
    ]
}

/// Return `key`'s value within the Map. If `key` does not exist, and
/// `default` is provided, it will return `default`. Otherwise, will error.
fn map_get(args: &[Value]) -> ScriptResult<Value> {
    let map = expect_map("map_get", args, 0)?;
    let key = expect_key("map_get", args, 1)?;
    match map.get(&key) {
        Some(value) => Ok(value.clone()),
        None => match args.get(2) {
            Some(default) => Ok(default.clone()),
            None => Err(ScriptError::KeyDoesNotExist(format!(
                "Tried to call %map_get with key {key}, but it does not exist"
            ))),
        },
    }
}

/// Returns True if the key is in the Map. False otherwise.
fn map_contains(args: &[Value]) -> ScriptResult<Value> {
    let map = expect_map("map_contains", args, 0)?;
    let key = expect_key("map_contains", args, 1)?;
    Ok(Value::Boolean(map.contains_key(&key)))
}

/// Apply a lambda function on the Map, where each arg passed to the lambda
/// function is `key, value` as two separate args.
fn map_apply(args: &[Value]) -> ScriptResult<Value> {
    let map = expect_map("map_apply", args, 0)?;
    Ok(Value::array(
        map.iter()
            .map(|(key, value)| Value::array(vec![key.to_value(), value.clone()]))
            .collect(),
    ))
}

/// Apply a lambda function on the Map, where each arg passed to the lambda
/// function is `idx, key, value` as three separate args.
fn map_enumerate(args: &[Value]) -> ScriptResult<Value> {
    let map = expect_map("map_enumerate", args, 0)?;
    Ok(Value::array(
        map.iter()
            .enumerate()
            .map(|(idx, (key, value))| {
                Value::array(vec![
                    Value::from(idx as i64),
                    key.to_value(),
                    value.clone(),
                ])
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{MapKey, ValueMap};

    fn sample_map() -> Value {
        let mut map = ValueMap::new();
        map.insert(MapKey::String("key".into()), Value::from("value"));
        Value::map(map)
    }

    #[test]
    fn get_returns_the_value() {
        let out = map_get(&[sample_map(), Value::from("key")]).unwrap();
        assert_eq!(out, Value::from("value"));
    }

    #[test]
    fn get_falls_back_to_the_default() {
        let out = map_get(&[sample_map(), Value::from("dne"), Value::from("optional_value")])
            .unwrap();
        assert_eq!(out, Value::from("optional_value"));
    }

    #[test]
    fn get_errors_on_missing_key() {
        assert_eq!(
            map_get(&[sample_map(), Value::from("dne")]),
            Err(ScriptError::KeyDoesNotExist(
                "Tried to call %map_get with key dne, but it does not exist".into()
            ))
        );
    }

    #[test]
    fn contains_checks_keys() {
        assert_eq!(
            map_contains(&[sample_map(), Value::from("key")]).unwrap(),
            Value::from(true)
        );
        assert_eq!(
            map_contains(&[sample_map(), Value::from("dne")]).unwrap(),
            Value::from(false)
        );
    }

    #[test]
    fn apply_rows_preserve_insertion_order() {
        let mut map = ValueMap::new();
        map.insert(MapKey::String("Key1".into()), Value::from("Value1"));
        map.insert(MapKey::String("Key2".into()), Value::from("Value2"));
        let rows = map_apply(&[Value::map(map), Value::lambda("f")]).unwrap();
        assert_eq!(
            rows,
            Value::array(vec![
                Value::array(vec![Value::from("Key1"), Value::from("Value1")]),
                Value::array(vec![Value::from("Key2"), Value::from("Value2")]),
            ])
        );
    }

    #[test]
    fn enumerate_rows_carry_the_index() {
        let mut map = ValueMap::new();
        map.insert(MapKey::String("k".into()), Value::from("v"));
        let rows = map_enumerate(&[Value::map(map), Value::lambda("f")]).unwrap();
        assert_eq!(
            rows,
            Value::array(vec![Value::array(vec![
                Value::from(0),
                Value::from("k"),
                Value::from("v"),
            ])])
        );
    }
}
