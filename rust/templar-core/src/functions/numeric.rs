//! Numeric functions.
//!
//! Integers are arbitrary-precision, so Integer arithmetic is exact and never
//! overflows. Mixed Integer/Float arithmetic runs in f64 and narrows: a
//! mathematically whole result comes back as an Integer, otherwise as a
//! Float. Exact Integer division yields an Integer.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, Zero};

use crate::error::{ScriptError, ScriptResult};
use crate::functions::{expect_any, expect_int, FunctionSpec, Params};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::{bigint_to_f64, Value};

pub(super) fn specs() -> Vec<FunctionSpec> {
    let binary = Params::Fixed(vec![TypeExpr::Numeric, TypeExpr::Numeric]);
    vec![
        FunctionSpec::new(
            "int",
            Params::Fixed(vec![TypeExpr::Any]),
            ReturnSpec::Fixed(TypeExpr::Integer),
            int,
        ),
        FunctionSpec::new(
            "float",
            Params::Fixed(vec![TypeExpr::Any]),
            ReturnSpec::Fixed(TypeExpr::Float),
            float,
        ),
        FunctionSpec::new("add", binary.clone(), ReturnSpec::Fixed(TypeExpr::Numeric), add),
        FunctionSpec::new("sub", binary.clone(), ReturnSpec::Fixed(TypeExpr::Numeric), sub),
        FunctionSpec::new("mul", binary.clone(), ReturnSpec::Fixed(TypeExpr::Numeric), mul),
        FunctionSpec::new("div", binary.clone(), ReturnSpec::Fixed(TypeExpr::Numeric), div),
        FunctionSpec::new("max", binary.clone(), ReturnSpec::Fixed(TypeExpr::Numeric), max),
        FunctionSpec::new("min", binary, ReturnSpec::Fixed(TypeExpr::Numeric), min),
        FunctionSpec::new(
            "mod",
            Params::Fixed(vec![TypeExpr::Integer, TypeExpr::Integer]),
            ReturnSpec::Fixed(TypeExpr::Integer),
            mod_,
        ),
    ]
}

/// Narrow a float result back to Integer when it is mathematically whole.
fn to_numeric(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 {
        BigInt::from_f64(value).map_or(Value::Float(value), Value::Integer)
    } else {
        Value::Float(value)
    }
}

/// Both operands as Integers, when they are.
fn integer_operands<'a>(args: &'a [Value]) -> Option<(&'a BigInt, &'a BigInt)> {
    match (args.first(), args.get(1)) {
        (Some(Value::Integer(a)), Some(Value::Integer(b))) => Some((a, b)),
        _ => None,
    }
}

fn numeric_operand(function: &str, args: &[Value], idx: usize) -> ScriptResult<f64> {
    match args.get(idx) {
        Some(Value::Integer(n)) => Ok(bigint_to_f64(n)),
        Some(Value::Float(x)) => Ok(*x),
        other => Err(ScriptError::runtime(
            function,
            format!(
                "expected Numeric, received {}",
                other.map_or("nothing", Value::type_name)
            ),
        )),
    }
}

/// Cast to Integer, truncating toward zero. Strings must parse as a number.
fn int(args: &[Value]) -> ScriptResult<Value> {
    let value = expect_any("int", args, 0)?;
    let out = match value {
        Value::Integer(n) => n.clone(),
        Value::Float(x) => BigInt::from_f64(x.trunc())
            .ok_or_else(|| ScriptError::runtime("int", format!("cannot cast {x} to Integer")))?,
        Value::Boolean(b) => BigInt::from(u8::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<BigInt>()
            .map_err(|_| ScriptError::runtime("int", format!("cannot cast {s:?} to Integer")))?,
        other => {
            return Err(ScriptError::runtime(
                "int",
                format!("cannot cast {} to Integer", other.type_name()),
            ))
        }
    };
    Ok(Value::Integer(out))
}

/// Cast to Float. Strings must parse as a number.
fn float(args: &[Value]) -> ScriptResult<Value> {
    let value = expect_any("float", args, 0)?;
    let out = match value {
        Value::Integer(n) => bigint_to_f64(n),
        Value::Float(x) => *x,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ScriptError::runtime("float", format!("cannot cast {s:?} to Float")))?,
        other => {
            return Err(ScriptError::runtime(
                "float",
                format!("cannot cast {} to Float", other.type_name()),
            ))
        }
    };
    Ok(Value::Float(out))
}

fn add(args: &[Value]) -> ScriptResult<Value> {
    if let Some((a, b)) = integer_operands(args) {
        return Ok(Value::Integer(a + b));
    }
    Ok(to_numeric(
        numeric_operand("add", args, 0)? + numeric_operand("add", args, 1)?,
    ))
}

fn sub(args: &[Value]) -> ScriptResult<Value> {
    if let Some((a, b)) = integer_operands(args) {
        return Ok(Value::Integer(a - b));
    }
    Ok(to_numeric(
        numeric_operand("sub", args, 0)? - numeric_operand("sub", args, 1)?,
    ))
}

fn mul(args: &[Value]) -> ScriptResult<Value> {
    if let Some((a, b)) = integer_operands(args) {
        return Ok(Value::Integer(a * b));
    }
    Ok(to_numeric(
        numeric_operand("mul", args, 0)? * numeric_operand("mul", args, 1)?,
    ))
}

fn div(args: &[Value]) -> ScriptResult<Value> {
    if let Some((a, b)) = integer_operands(args) {
        if b.is_zero() {
            return Err(ScriptError::runtime("div", "division by zero"));
        }
        if (a % b).is_zero() {
            return Ok(Value::Integer(a / b));
        }
    }
    let denominator = numeric_operand("div", args, 1)?;
    if denominator == 0.0 {
        return Err(ScriptError::runtime("div", "division by zero"));
    }
    Ok(to_numeric(numeric_operand("div", args, 0)? / denominator))
}

fn max(args: &[Value]) -> ScriptResult<Value> {
    if let Some((a, b)) = integer_operands(args) {
        return Ok(Value::Integer(a.max(b).clone()));
    }
    let left = numeric_operand("max", args, 0)?;
    let right = numeric_operand("max", args, 1)?;
    Ok(to_numeric(left.max(right)))
}

fn min(args: &[Value]) -> ScriptResult<Value> {
    if let Some((a, b)) = integer_operands(args) {
        return Ok(Value::Integer(a.min(b).clone()));
    }
    let left = numeric_operand("min", args, 0)?;
    let right = numeric_operand("min", args, 1)?;
    Ok(to_numeric(left.min(right)))
}

/// Floored modulo, following the sign of the divisor.
fn mod_(args: &[Value]) -> ScriptResult<Value> {
    let value = expect_int("mod", args, 0)?;
    let modulo = expect_int("mod", args, 1)?;
    if modulo.is_zero() {
        return Err(ScriptError::runtime("mod", "division by zero"));
    }
    let rem = value % modulo;
    let out = if !rem.is_zero() && rem.is_negative() != modulo.is_negative() {
        rem + modulo
    } else {
        rem
    };
    Ok(Value::Integer(out))
}
