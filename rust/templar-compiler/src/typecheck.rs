//! Static argument checking for built-in calls, run while parsing.
//!
//! Literals carry their concrete type; variables, `$N` placeholders and
//! custom-function calls are unconstrained and get re-checked with concrete
//! values at evaluation. Nested built-in calls contribute their declared
//! return type, with generic return markers projected onto the static types
//! of the referenced arguments.

use templar_core::error::{ScriptError, ScriptResult};
use templar_core::functions::{self, FunctionSpec, Params};
use templar_core::types::{ReturnSpec, StaticType, TypeExpr};
use templar_core::value::Value;

use crate::ast::{CallKind, Expr, FunctionCall};

/// The statically known type of an argument expression.
pub fn static_type(expr: &Expr) -> StaticType {
    match expr {
        Expr::Literal(value) => StaticType::Of(value.type_of()),
        Expr::Variable(_) | Expr::FunctionArg(_) => StaticType::Unconstrained,
        Expr::Array(_) => StaticType::Of(TypeExpr::Array),
        Expr::Map(_) => StaticType::Of(TypeExpr::Map),
        Expr::Call(call) => match call.kind {
            CallKind::Custom => StaticType::Unconstrained,
            CallKind::Builtin => match functions::lookup(&call.name) {
                None => StaticType::Unconstrained,
                Some(spec) => match spec.ret {
                    ReturnSpec::Fixed(t) => StaticType::Of(t),
                    ReturnSpec::FromArgs(indices) => StaticType::union_of(
                        indices
                            .iter()
                            .filter_map(|idx| call.args.get(*idx))
                            .map(static_type),
                    ),
                    ReturnSpec::Never => StaticType::Unconstrained,
                },
            },
        },
    }
}

/// Verify a built-in call's arguments against its signature.
pub fn check_call(call: &FunctionCall, spec: &FunctionSpec) -> ScriptResult<()> {
    let compatible = match &spec.params {
        Params::Fixed(params) => {
            call.args.len() <= params.len()
                && params
                    .iter()
                    .enumerate()
                    .all(|(idx, param)| match call.args.get(idx) {
                        None => param.is_optional(),
                        Some(arg) if param.is_lambda() => {
                            // The lambda slot takes only a lambda reference,
                            // not an arbitrary expression of Lambda type.
                            matches!(arg, Expr::Literal(Value::Lambda(_)))
                        }
                        Some(arg) => param.accepts(&static_type(arg)),
                    })
        }
        Params::Variadic(inner) => call
            .args
            .iter()
            .all(|arg| inner.accepts(&static_type(arg))),
    };
    if compatible {
        Ok(())
    } else {
        Err(ScriptError::IncompatibleFunctionArguments {
            name: call.name.clone(),
            expected: spec.params.expected_str(),
            received: received_str(&call.args),
        })
    }
}

fn received_str(args: &[Expr]) -> String {
    let rendered: Vec<String> = args.iter().map(arg_display).collect();
    format!("({})", rendered.join(", "))
}

fn arg_display(arg: &Expr) -> String {
    match arg {
        Expr::Literal(value) => value.type_name().to_string(),
        Expr::Variable(_) => "Variable".to_string(),
        Expr::FunctionArg(_) => "FunctionArgument".to_string(),
        Expr::Array(_) => "Array".to_string(),
        Expr::Map(_) => "Map".to_string(),
        Expr::Call(call) => match call.kind {
            CallKind::Builtin => format!("%{}(...)->{}", call.name, static_type(arg)),
            CallKind::Custom => format!("%{}(...)", call.name),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn expect_incompatible(format_string: &str) -> (String, String, String) {
        match parse(format_string) {
            Err(ScriptError::IncompatibleFunctionArguments {
                name,
                expected,
                received,
            }) => (name, expected, received),
            other => panic!("expected an argument type error, got {other:?}"),
        }
    }

    #[test]
    fn variadic_mismatch_renders_expected_and_received() {
        let (name, expected, received) = expect_incompatible("{%array_extend('not', 'array')}");
        assert_eq!(name, "array_extend");
        assert_eq!(expected, "(Array, ...)");
        assert_eq!(received, "(String, String)");
    }

    #[test]
    fn union_return_does_not_satisfy_a_concrete_parameter() {
        let (name, _, received) = expect_incompatible("{%map_get(%if(True, {}, []), 'k')}");
        assert_eq!(name, "map_get");
        assert_eq!(received, "(%if(...)->Map | Array, String)");
    }

    #[test]
    fn matching_branches_collapse_the_union() {
        // Both branches are Maps, so %if returns a plain Map.
        assert!(parse("{%map_get(%if(True, {}, {'a': 'b'}), 'k')}").is_ok());
    }

    #[test]
    fn variables_are_unconstrained() {
        assert!(parse("{%add(a, b)}").is_ok());
        assert!(parse("{%upper(anything)}").is_ok());
    }

    #[test]
    fn literal_type_mismatches_are_caught() {
        let (name, expected, received) = expect_incompatible("{%upper(%int(1))}");
        assert_eq!(name, "upper");
        assert_eq!(expected, "(String)");
        assert_eq!(received, "(%int(...)->Integer)");
    }

    #[test]
    fn too_many_arguments_are_rejected() {
        let (name, _, received) = expect_incompatible("{%not(True, False)}");
        assert_eq!(name, "not");
        assert_eq!(received, "(Boolean, Boolean)");
    }

    #[test]
    fn missing_non_optional_arguments_are_rejected() {
        let (name, expected, received) = expect_incompatible("{%replace('a', 'b')}");
        assert_eq!(name, "replace");
        assert_eq!(expected, "(String, String, String, Optional[Integer])");
        assert_eq!(received, "(String, String)");
    }

    #[test]
    fn optional_tail_may_be_omitted() {
        assert!(parse("{%replace('aa', 'a', 'b')}").is_ok());
        assert!(parse("{%replace('aa', 'a', 'b', %int(1))}").is_ok());
    }

    #[test]
    fn lambda_slot_requires_a_lambda_reference() {
        assert!(parse("{%array_apply([], %upper)}").is_ok());
        let (name, _, received) = expect_incompatible("{%array_apply([], 'upper')}");
        assert_eq!(name, "array_apply");
        assert_eq!(received, "(Array, String)");
    }

    #[test]
    fn custom_calls_are_unconstrained_arguments() {
        assert!(parse("{%upper(%my_custom('a'))}").is_ok());
    }

    #[test]
    fn throw_satisfies_any_parameter() {
        assert!(parse("{%upper(%throw('nope'))}").is_ok());
    }
}
