//! Tree evaluation under a variable environment and custom-function table.

use indexmap::IndexMap;

use templar_compiler::ast::{CallKind, CustomFunction, Expr, FunctionCall, SyntaxTree};
use templar_core::error::{ScriptError, ScriptResult};
use templar_core::functions;
use templar_core::value::{MapKey, Value, ValueMap};

pub(crate) struct Evaluator<'a> {
    variables: &'a IndexMap<String, Value>,
    custom_functions: &'a IndexMap<String, CustomFunction>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        variables: &'a IndexMap<String, Value>,
        custom_functions: &'a IndexMap<String, CustomFunction>,
    ) -> Self {
        Self {
            variables,
            custom_functions,
        }
    }

    /// Resolve a whole tree. A single-token tree returns its value unchanged;
    /// multiple tokens concatenate their display renderings.
    pub(crate) fn eval_tree(&self, tree: &SyntaxTree) -> ScriptResult<Value> {
        self.eval_tree_with(tree, None)
    }

    fn eval_tree_with(&self, tree: &SyntaxTree, frame: Option<&[Value]>) -> ScriptResult<Value> {
        let mut resolved = Vec::with_capacity(tree.tokens.len());
        for token in &tree.tokens {
            resolved.push(self.eval_expr(token, frame)?);
        }
        if resolved.len() == 1 {
            return Ok(resolved.remove(0));
        }
        Ok(Value::string(
            resolved.iter().map(ToString::to_string).collect::<String>(),
        ))
    }

    fn eval_expr(&self, expr: &Expr, frame: Option<&[Value]>) -> ScriptResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => self.variables.get(name).cloned().ok_or_else(|| {
                // The resolver only evaluates trees whose dependencies are
                // resolved, so this means a bookkeeping bug upstream.
                ScriptError::StringFormatting(format!("variable {name} has not been resolved"))
            }),
            Expr::FunctionArg(idx) => frame
                .and_then(|args| args.get(*idx))
                .cloned()
                .ok_or_else(|| {
                    ScriptError::StringFormatting(format!(
                        "function argument ${idx} used outside a custom function"
                    ))
                }),
            Expr::Call(call) => self.eval_call(call, frame),
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval_expr(item, frame)?);
                }
                Ok(Value::array(out))
            }
            Expr::Map(entries) => {
                let mut map = ValueMap::new();
                for (key_expr, value_expr) in entries {
                    let key_value = self.eval_expr(key_expr, frame)?;
                    let key = MapKey::from_value(&key_value).ok_or_else(|| {
                        ScriptError::StringFormatting(format!(
                            "map keys must be an Integer, String, or Boolean, received {}",
                            key_value.type_name()
                        ))
                    })?;
                    map.insert(key, self.eval_expr(value_expr, frame)?);
                }
                Ok(Value::map(map))
            }
        }
    }

    fn eval_call(&self, call: &FunctionCall, frame: Option<&[Value]>) -> ScriptResult<Value> {
        let mut values = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            values.push(self.eval_expr(arg, frame)?);
        }
        match call.kind {
            CallKind::Builtin => self.invoke_builtin(&call.name, &values),
            CallKind::Custom => self.invoke_custom(&call.name, values),
        }
    }

    /// Dispatch a synthesized or lambda call by name: the custom table wins,
    /// then the registry.
    fn call_by_name(&self, name: &str, values: Vec<Value>) -> ScriptResult<Value> {
        if self.custom_functions.contains_key(name) {
            self.invoke_custom(name, values)
        } else {
            self.invoke_builtin(name, &values)
        }
    }

    fn invoke_builtin(&self, name: &str, values: &[Value]) -> ScriptResult<Value> {
        let Some(spec) = functions::lookup(name) else {
            return Err(ScriptError::FunctionDoesNotExist {
                name: name.to_string(),
            });
        };
        // Concrete values are checked on every invocation; this is what backs
        // arguments fed through unconstrained variables and lambda rows.
        spec.check_values(values)?;
        if spec.params.lambda_arity().is_some() {
            return self.apply_lambda(&spec, values);
        }
        (spec.handler)(values)
    }

    /// The higher-order protocol: a lambda-taking built-in returns an Array
    /// whose elements are ready-made argument Arrays for the referenced
    /// lambda. One call per element is synthesized and resolved here.
    fn apply_lambda(
        &self,
        spec: &functions::FunctionSpec,
        values: &[Value],
    ) -> ScriptResult<Value> {
        let Some(Value::Lambda(lambda)) = values.last() else {
            return Err(ScriptError::runtime(
                &spec.name,
                "the lambda argument must be a function reference",
            ));
        };
        let rows = (spec.handler)(values)?;
        let Value::Array(rows) = rows else {
            return Err(ScriptError::runtime(
                &spec.name,
                "lambda functions must produce an Array of argument Arrays",
            ));
        };
        let mut out = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            let Value::Array(row_args) = row else {
                return Err(ScriptError::runtime(
                    &spec.name,
                    "lambda functions must produce an Array of argument Arrays",
                ));
            };
            out.push(self.call_by_name(&lambda.name, row_args.as_ref().clone())?);
        }
        Ok(Value::array(out))
    }

    fn invoke_custom(&self, name: &str, values: Vec<Value>) -> ScriptResult<Value> {
        match self.custom_functions.get(name) {
            Some(custom) => {
                if values.len() != custom.arity {
                    return Err(ScriptError::StringFormatting(format!(
                        "custom function %{name} expects {} arguments, received {}",
                        custom.arity,
                        values.len()
                    )));
                }
                self.eval_tree_with(&custom.body, Some(&values))
            }
            // A call parsed as custom may still name a registry function when
            // the registry gained it after parsing; fall through for the
            // definitive does-not-exist error otherwise.
            None => self.invoke_builtin(name, &values),
        }
    }
}
