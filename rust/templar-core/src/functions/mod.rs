//! The typed function registry.
//!
//! Built-in families live one-per-module below and are unioned into the
//! default registry at construction. Host-registered functions go through the
//! same [`register`] path and are indistinguishable from built-ins afterwards.
//!
//! Where a function's natural name is a reserved word (`if`, `and`, `or`,
//! `not`, `bool`, `mod`), the implementation carries a trailing underscore
//! and registers under the natural name.

mod array;
mod boolean;
mod conditional;
mod control;
mod map;
mod numeric;
mod string;

use std::sync::RwLock;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::error::{ScriptError, ScriptResult};
use crate::types::{ReturnSpec, TypeExpr};
use crate::value::Value;

pub type FunctionHandler = fn(&[Value]) -> ScriptResult<Value>;

/// A registered function: a typed signature plus its implementation.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub params: Params,
    pub ret: ReturnSpec,
    pub handler: FunctionHandler,
}

/// Formal parameters: a fixed positional list (possibly with an Optional
/// tail) or a single variadic parameter, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    Fixed(Vec<TypeExpr>),
    Variadic(TypeExpr),
}

impl Params {
    /// The rendering used in `Expected (...)` diagnostics.
    pub fn expected_str(&self) -> String {
        match self {
            Params::Fixed(params) => {
                let names: Vec<String> = params.iter().map(ToString::to_string).collect();
                format!("({})", names.join(", "))
            }
            Params::Variadic(inner) => format!("({inner}, ...)"),
        }
    }

    /// If the last parameter is a Lambda, the arity its references are
    /// invoked with.
    pub fn lambda_arity(&self) -> Option<usize> {
        match self {
            Params::Fixed(params) => match params.last() {
                Some(TypeExpr::Lambda(arity)) => Some(*arity),
                _ => None,
            },
            Params::Variadic(_) => None,
        }
    }
}

impl FunctionSpec {
    pub fn new(name: &str, params: Params, ret: ReturnSpec, handler: FunctionHandler) -> Self {
        Self {
            name: name.to_string(),
            params,
            ret,
            handler,
        }
    }

    /// Check concrete argument values against the signature. This runs before
    /// every invocation, so it also covers arguments that reached the call
    /// through unconstrained variables and calls synthesized for lambdas.
    pub fn check_values(&self, values: &[Value]) -> ScriptResult<()> {
        let compatible = match &self.params {
            Params::Fixed(params) => {
                values.len() <= params.len()
                    && params
                        .iter()
                        .enumerate()
                        .all(|(idx, param)| match values.get(idx) {
                            Some(value) => param.accepts_concrete(&value.type_of()),
                            None => param.is_optional(),
                        })
            }
            Params::Variadic(inner) => values
                .iter()
                .all(|value| inner.accepts_concrete(&value.type_of())),
        };
        if compatible {
            Ok(())
        } else {
            Err(ScriptError::IncompatibleFunctionArguments {
                name: self.name.clone(),
                expected: self.params.expected_str(),
                received: received_str(values),
            })
        }
    }
}

/// Render concrete argument types as a `Received (...)` tuple.
pub fn received_str(values: &[Value]) -> String {
    let names: Vec<&str> = values.iter().map(Value::type_name).collect();
    format!("({})", names.join(", "))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("function name {0:?} is not a valid identifier")]
    InvalidName(String),
    #[error("function {0} declares a Lambda parameter somewhere other than the last position")]
    LambdaNotLast(String),
    #[error("function {0} declares an Optional parameter outside the signature tail")]
    OptionalNotTail(String),
    #[error("function {0} declares an Optional or Lambda variadic parameter")]
    InvalidVariadic(String),
    #[error("function {0} is already registered")]
    Duplicate(String),
}

/// All registered functions, keyed by name.
#[derive(Debug, Default)]
pub struct Registry {
    functions: IndexMap<String, FunctionSpec>,
}

impl Registry {
    /// A registry holding every built-in family.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        let families = [
            string::specs(),
            numeric::specs(),
            boolean::specs(),
            conditional::specs(),
            array::specs(),
            map::specs(),
            control::specs(),
        ];
        for spec in families.into_iter().flatten() {
            registry
                .register(spec)
                .expect("built-in specs satisfy registration invariants");
        }
        registry
    }

    pub fn register(&mut self, spec: FunctionSpec) -> Result<(), RegistrationError> {
        validate_spec(&spec)?;
        if self.functions.contains_key(&spec.name) {
            return Err(RegistrationError::Duplicate(spec.name));
        }
        self.functions.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

fn validate_spec(spec: &FunctionSpec) -> Result<(), RegistrationError> {
    let mut chars = spec.name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RegistrationError::InvalidName(spec.name.clone()));
    }
    match &spec.params {
        Params::Fixed(params) => {
            let mut tail = false;
            for (idx, param) in params.iter().enumerate() {
                if param.is_lambda() && idx + 1 != params.len() {
                    return Err(RegistrationError::LambdaNotLast(spec.name.clone()));
                }
                if tail && !param.is_optional() {
                    return Err(RegistrationError::OptionalNotTail(spec.name.clone()));
                }
                tail = tail || param.is_optional();
            }
        }
        Params::Variadic(inner) => {
            if inner.is_optional() || inner.is_lambda() {
                return Err(RegistrationError::InvalidVariadic(spec.name.clone()));
            }
        }
    }
    Ok(())
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| RwLock::new(Registry::with_builtins()));

/// Register a host-defined function. Intended for process start-up, before
/// any Script is parsed; the registry is read-only from then on.
pub fn register(spec: FunctionSpec) -> Result<(), RegistrationError> {
    REGISTRY
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .register(spec)
}

/// Look up a registered function by name.
pub fn lookup(name: &str) -> Option<FunctionSpec> {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
        .cloned()
}

pub fn exists(name: &str) -> bool {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .contains(name)
}

// Argument accessors for handlers. Signatures are checked before dispatch, so
// a kind mismatch here means a registration bug, surfaced as a runtime error
// rather than a panic.

pub(crate) fn expect_any<'a>(
    function: &str,
    args: &'a [Value],
    idx: usize,
) -> ScriptResult<&'a Value> {
    args.get(idx)
        .ok_or_else(|| kind_mismatch(function, "a value", None))
}

pub(crate) fn expect_str<'a>(function: &str, args: &'a [Value], idx: usize) -> ScriptResult<&'a str> {
    match args.get(idx) {
        Some(Value::String(s)) => Ok(s),
        other => Err(kind_mismatch(function, "String", other)),
    }
}

pub(crate) fn expect_int<'a>(
    function: &str,
    args: &'a [Value],
    idx: usize,
) -> ScriptResult<&'a BigInt> {
    match args.get(idx) {
        Some(Value::Integer(n)) => Ok(n),
        other => Err(kind_mismatch(function, "Integer", other)),
    }
}

/// An Integer argument used as an index or count; anything outside i64 is out
/// of range for every container this engine can hold.
pub(crate) fn expect_i64(function: &str, args: &[Value], idx: usize) -> ScriptResult<i64> {
    expect_int(function, args, idx)?.to_i64().ok_or_else(|| {
        ScriptError::runtime(function, "Integer argument is out of range")
    })
}

pub(crate) fn expect_bool(function: &str, args: &[Value], idx: usize) -> ScriptResult<bool> {
    match args.get(idx) {
        Some(Value::Boolean(b)) => Ok(*b),
        other => Err(kind_mismatch(function, "Boolean", other)),
    }
}

pub(crate) fn expect_array<'a>(
    function: &str,
    args: &'a [Value],
    idx: usize,
) -> ScriptResult<&'a [Value]> {
    match args.get(idx) {
        Some(Value::Array(values)) => Ok(values),
        other => Err(kind_mismatch(function, "Array", other)),
    }
}

pub(crate) fn expect_map<'a>(
    function: &str,
    args: &'a [Value],
    idx: usize,
) -> ScriptResult<&'a crate::value::ValueMap> {
    match args.get(idx) {
        Some(Value::Map(map)) => Ok(map),
        other => Err(kind_mismatch(function, "Map", other)),
    }
}

pub(crate) fn expect_key(
    function: &str,
    args: &[Value],
    idx: usize,
) -> ScriptResult<crate::value::MapKey> {
    args.get(idx)
        .and_then(crate::value::MapKey::from_value)
        .ok_or_else(|| kind_mismatch(function, "Hashable", args.get(idx)))
}

fn kind_mismatch(function: &str, expected: &str, actual: Option<&Value>) -> ScriptError {
    let actual = actual.map_or("nothing", Value::type_name);
    ScriptError::runtime(function, format!("expected {expected}, received {actual}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_cleanly() {
        let registry = Registry::with_builtins();
        for name in ["if", "and", "or", "not", "bool", "mod", "map_apply"] {
            assert!(registry.contains(name), "missing built-in {name}");
        }
    }

    #[test]
    fn lambda_must_be_last() {
        let spec = FunctionSpec::new(
            "bad",
            Params::Fixed(vec![TypeExpr::Lambda(1), TypeExpr::Array]),
            ReturnSpec::Fixed(TypeExpr::Array),
            |_| Ok(Value::from(0)),
        );
        assert_eq!(
            Registry::default().register(spec),
            Err(RegistrationError::LambdaNotLast("bad".into()))
        );
    }

    #[test]
    fn optional_only_in_tail() {
        let spec = FunctionSpec::new(
            "bad",
            Params::Fixed(vec![
                TypeExpr::Optional(Box::new(TypeExpr::Integer)),
                TypeExpr::Integer,
            ]),
            ReturnSpec::Fixed(TypeExpr::Integer),
            |_| Ok(Value::from(0)),
        );
        assert_eq!(
            Registry::default().register(spec),
            Err(RegistrationError::OptionalNotTail("bad".into()))
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mk = || {
            FunctionSpec::new(
                "twice",
                Params::Fixed(vec![]),
                ReturnSpec::Fixed(TypeExpr::Integer),
                |_| Ok(Value::from(0)),
            )
        };
        let mut registry = Registry::default();
        assert_eq!(registry.register(mk()), Ok(()));
        assert_eq!(
            registry.register(mk()),
            Err(RegistrationError::Duplicate("twice".into()))
        );
    }

    #[test]
    fn check_values_honors_optional_tail() {
        let registry = Registry::with_builtins();
        let replace = registry.get("replace").expect("replace is built in");
        let base = vec![Value::from("aa"), Value::from("a"), Value::from("b")];
        assert!(replace.check_values(&base).is_ok());

        let mut with_count = base.clone();
        with_count.push(Value::from(1));
        assert!(replace.check_values(&with_count).is_ok());

        let mut too_many = with_count.clone();
        too_many.push(Value::from(1));
        assert!(replace.check_values(&too_many).is_err());

        assert!(replace.check_values(&base[..2]).is_err());
    }
}
