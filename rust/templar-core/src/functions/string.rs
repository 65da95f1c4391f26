//! String functions.

use crate::error::ScriptResult;
use crate::functions::{expect_any, expect_i64, expect_str, FunctionSpec, Params};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::Value;

pub(super) fn specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec::new(
            "string",
            Params::Fixed(vec![TypeExpr::Any]),
            ReturnSpec::Fixed(TypeExpr::String),
            string,
        ),
        FunctionSpec::new(
            "lower",
            Params::Fixed(vec![TypeExpr::String]),
            ReturnSpec::Fixed(TypeExpr::String),
            lower,
        ),
        FunctionSpec::new(
            "upper",
            Params::Fixed(vec![TypeExpr::String]),
            ReturnSpec::Fixed(TypeExpr::String),
            upper,
        ),
        FunctionSpec::new(
            "capitalize",
            Params::Fixed(vec![TypeExpr::String]),
            ReturnSpec::Fixed(TypeExpr::String),
            capitalize,
        ),
        FunctionSpec::new(
            "titlecase",
            Params::Fixed(vec![TypeExpr::String]),
            ReturnSpec::Fixed(TypeExpr::String),
            titlecase,
        ),
        FunctionSpec::new(
            "replace",
            Params::Fixed(vec![
                TypeExpr::String,
                TypeExpr::String,
                TypeExpr::String,
                TypeExpr::Optional(Box::new(TypeExpr::Integer)),
            ]),
            ReturnSpec::Fixed(TypeExpr::String),
            replace,
        ),
        FunctionSpec::new(
            "concat",
            Params::Variadic(TypeExpr::String),
            ReturnSpec::Fixed(TypeExpr::String),
            concat,
        ),
    ]
}

/// Cast to String.
fn string(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::string(expect_any("string", args, 0)?.to_string()))
}

/// Lower-case the entire String.
fn lower(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::string(expect_str("lower", args, 0)?.to_lowercase()))
}

/// Upper-case the entire String.
fn upper(args: &[Value]) -> ScriptResult<Value> {
    Ok(Value::string(expect_str("upper", args, 0)?.to_uppercase()))
}

/// Capitalize the first character in the String and lower-case the rest.
fn capitalize(args: &[Value]) -> ScriptResult<Value> {
    let s = expect_str("capitalize", args, 0)?;
    let mut chars = s.chars();
    let out = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    };
    Ok(Value::string(out))
}

/// Capitalize each word in the String.
fn titlecase(args: &[Value]) -> ScriptResult<Value> {
    let s = expect_str("titlecase", args, 0)?;
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    Ok(Value::string(out))
}

/// Replace the `old` part of the String with the `new`. Optionally only
/// replace it `count` number of times.
fn replace(args: &[Value]) -> ScriptResult<Value> {
    let s = expect_str("replace", args, 0)?;
    let old = expect_str("replace", args, 1)?;
    let new = expect_str("replace", args, 2)?;
    let out = if args.len() > 3 {
        let count = expect_i64("replace", args, 3)?.max(0) as usize;
        s.replacen(old, new, count)
    } else {
        s.replace(old, new)
    };
    Ok(Value::string(out))
}

/// Concatenate multiple Strings into a single String.
fn concat(args: &[Value]) -> ScriptResult<Value> {
    let mut out = String::new();
    for (idx, _) in args.iter().enumerate() {
        out.push_str(expect_str("concat", args, idx)?);
    }
    Ok(Value::string(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_lowers_the_tail() {
        let out = capitalize(&[Value::from("hELLO wORLD")]).unwrap();
        assert_eq!(out, Value::from("Hello world"));
    }

    #[test]
    fn titlecase_capitalizes_each_word() {
        let out = titlecase(&[Value::from("hi mom the title")]).unwrap();
        assert_eq!(out, Value::from("Hi Mom The Title"));
    }

    #[test]
    fn replace_honors_count() {
        let args = [
            Value::from("aaa"),
            Value::from("a"),
            Value::from("b"),
            Value::from(2),
        ];
        assert_eq!(replace(&args).unwrap(), Value::from("bba"));
        assert_eq!(replace(&args[..3]).unwrap(), Value::from("bbb"));
    }

    #[test]
    fn string_casts_via_display() {
        assert_eq!(string(&[Value::from(true)]).unwrap(), Value::from("True"));
        assert_eq!(string(&[Value::from(2.5)]).unwrap(), Value::from("2.5"));
    }
}
