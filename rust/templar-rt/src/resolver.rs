//! Dependency-ordered variable resolution.
//!
//! Iterative fixpoint: each pass evaluates every pending variable whose
//! dependencies are fully resolved, until nothing is pending. A pass that
//! makes no progress on a non-empty pending set is a cycle. No topological
//! sort on purpose; the quadratic worst case is fine at the scale of a few
//! dozen variables.

use std::collections::HashSet;

use indexmap::IndexMap;

use templar_compiler::ast::{CustomFunction, SyntaxTree};
use templar_core::error::{ScriptError, ScriptResult};
use templar_core::value::Value;

use crate::eval::Evaluator;

pub(crate) const CYCLE_DETECTED: &str = "did not resolve any variables, cycle detected";

/// Resolve every tree whose dependencies can be met, starting from the
/// pre-resolved snapshot. Names in `unresolvable` — and anything depending on
/// them, transitively — are skipped without error and left for a later
/// invocation.
pub(crate) fn resolve_variables(
    trees: &IndexMap<String, SyntaxTree>,
    custom_functions: &IndexMap<String, CustomFunction>,
    pre_resolved: IndexMap<String, Value>,
    unresolvable: &HashSet<String>,
) -> ScriptResult<IndexMap<String, Value>> {
    let mut resolved = pre_resolved;
    let mut skipped: HashSet<String> = unresolvable.clone();
    let mut pending: Vec<(&String, &SyntaxTree)> = trees
        .iter()
        .filter(|(name, _)| !resolved.contains_key(*name) && !skipped.contains(*name))
        .collect();

    while !pending.is_empty() {
        let before = pending.len();
        let mut still_pending = Vec::with_capacity(pending.len());
        for (name, tree) in pending {
            let deps = dependencies(tree, custom_functions);
            if deps.iter().any(|dep| skipped.contains(dep)) {
                skipped.insert(name.clone());
            } else if deps.iter().all(|dep| resolved.contains_key(dep)) {
                let value = Evaluator::new(&resolved, custom_functions).eval_tree(tree)?;
                resolved.insert(name.clone(), value);
            } else {
                still_pending.push((name, tree));
            }
        }
        if still_pending.len() == before {
            return Err(ScriptError::StringFormatting(CYCLE_DETECTED.to_string()));
        }
        pending = still_pending;
    }
    Ok(resolved)
}

/// Variable names a tree depends on, chased through the bodies of the custom
/// functions it references. The visited set bounds self-recursive functions.
fn dependencies(
    tree: &SyntaxTree,
    custom_functions: &IndexMap<String, CustomFunction>,
) -> HashSet<String> {
    let mut deps = HashSet::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<&SyntaxTree> = vec![tree];
    while let Some(current) = stack.pop() {
        deps.extend(current.variables());
        for name in current.function_refs() {
            if visited.insert(name.clone()) {
                if let Some(custom) = custom_functions.get(&name) {
                    stack.push(&custom.body);
                }
            }
        }
    }
    deps
}
