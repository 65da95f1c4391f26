//! Syntax trees produced by the parser.
//!
//! A format string parses into an ordered list of tokens; each token is a
//! literal, a variable reference, a positional `$N` placeholder, a function
//! call, or an array/map literal whose elements may themselves be
//! expressions. Trees are immutable once parsed.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use templar_core::error::{ScriptError, ScriptResult};
use templar_core::value::Value;

/// Whether a call dispatches to the function registry or to the Script's
/// custom-function table. Decided at parse time by registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallKind {
    Builtin,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub kind: CallKind,
    pub args: Vec<Expr>,
}

/// One expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    /// Positional placeholder `$N` inside a custom-function body.
    FunctionArg(usize),
    Call(FunctionCall),
    Array(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
}

impl Expr {
    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match self {
            Expr::Call(call) => {
                for arg in &call.args {
                    arg.walk(visit);
                }
            }
            Expr::Array(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            Expr::Map(entries) => {
                for (key, value) in entries {
                    key.walk(visit);
                    value.walk(visit);
                }
            }
            Expr::Literal(_) | Expr::Variable(_) | Expr::FunctionArg(_) => {}
        }
    }
}

/// The parsed token list for one format string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxTree {
    pub tokens: Vec<Expr>,
}

impl SyntaxTree {
    pub fn new(tokens: Vec<Expr>) -> Self {
        Self { tokens }
    }

    fn collect<'a, T>(&'a self, mut pick: impl FnMut(&'a Expr) -> Option<T>, out: &mut impl Extend<T>) {
        for token in &self.tokens {
            token.walk(&mut |expr| {
                if let Some(picked) = pick(expr) {
                    out.extend(std::iter::once(picked));
                }
            });
        }
    }

    /// All variable names referenced anywhere in the tree.
    pub fn variables(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        self.collect(
            |expr| match expr {
                Expr::Variable(name) => Some(name.clone()),
                _ => None,
            },
            &mut out,
        );
        out
    }

    /// All `$N` placeholder indices in the tree.
    pub fn function_args(&self) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        self.collect(
            |expr| match expr {
                Expr::FunctionArg(idx) => Some(*idx),
                _ => None,
            },
            &mut out,
        );
        out
    }

    /// Names that may resolve to custom functions: unregistered calls and
    /// lambda references. Used to chase variable dependencies through
    /// custom-function bodies.
    pub fn function_refs(&self) -> HashSet<String> {
        let mut out = HashSet::new();
        self.collect(
            |expr| match expr {
                Expr::Call(call) if call.kind == CallKind::Custom => Some(call.name.clone()),
                Expr::Literal(Value::Lambda(lambda)) => Some(lambda.name.clone()),
                _ => None,
            },
            &mut out,
        );
        out
    }
}

/// A user-defined function: an AST parameterized by `$0, $1, …` placeholders.
/// Indexing is 0-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomFunction {
    pub body: SyntaxTree,
    pub arity: usize,
}

impl CustomFunction {
    /// Wrap a parsed body, inferring arity as `max($N) + 1` and requiring
    /// every index in `[0, arity)` to occur at least once.
    pub fn from_body(name: &str, body: SyntaxTree) -> ScriptResult<CustomFunction> {
        let indices = body.function_args();
        let arity = indices.iter().next_back().map_or(0, |max| max + 1);
        for expected in 0..arity {
            if !indices.contains(&expected) {
                return Err(ScriptError::StringFormatting(format!(
                    "custom function %{name} must use all arguments $0 through ${}, but ${expected} is missing",
                    arity - 1
                )));
            }
        }
        Ok(CustomFunction { body, arity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, kind: CallKind, args: Vec<Expr>) -> Expr {
        Expr::Call(FunctionCall {
            name: name.to_string(),
            kind,
            args,
        })
    }

    #[test]
    fn variables_are_collected_recursively() {
        let tree = SyntaxTree::new(vec![call(
            "map_get",
            CallKind::Builtin,
            vec![
                Expr::Variable("entry".into()),
                Expr::Array(vec![Expr::Variable("key".into())]),
            ],
        )]);
        let vars = tree.variables();
        assert!(vars.contains("entry"));
        assert!(vars.contains("key"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn custom_function_arity_is_max_plus_one() {
        let body = SyntaxTree::new(vec![Expr::Array(vec![
            Expr::FunctionArg(0),
            Expr::FunctionArg(1),
        ])]);
        let custom = CustomFunction::from_body("f", body).unwrap();
        assert_eq!(custom.arity, 2);
    }

    #[test]
    fn custom_function_requires_contiguous_indices() {
        let body = SyntaxTree::new(vec![Expr::FunctionArg(1)]);
        assert!(CustomFunction::from_body("f", body).is_err());
    }

    #[test]
    fn lambda_references_count_as_function_refs() {
        let tree = SyntaxTree::new(vec![call(
            "map_apply",
            CallKind::Builtin,
            vec![
                Expr::Variable("m".into()),
                Expr::Literal(Value::lambda("custom_func")),
            ],
        )]);
        assert!(tree.function_refs().contains("custom_func"));
    }
}
