//! The Script façade: a bag of named variable trees, a custom-function table
//! and an optional cached resolution.

use std::collections::HashSet;

use indexmap::IndexMap;

use templar_compiler::ast::CustomFunction;
use templar_compiler::ast::SyntaxTree;
use templar_compiler::parser::parse;
use templar_core::error::{ScriptError, ScriptResult};
use templar_core::value::Value;

use crate::resolver;

/// Inputs to [`Script::resolve`].
///
/// `resolved` seeds values the host supplies directly (these are never
/// re-evaluated, even when the Script holds a tree of the same name).
/// `unresolvable` names must not be evaluated this pass; their dependents are
/// skipped silently. With `update`, the output is also cached inside the
/// Script so the next resolution starts from it and [`Script::get`] works.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub resolved: IndexMap<String, Value>,
    pub unresolvable: HashSet<String>,
    pub update: bool,
}

impl ResolveOptions {
    pub fn resolved(mut self, resolved: IndexMap<String, Value>) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn unresolvable<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unresolvable = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn update(mut self) -> Self {
        self.update = true;
        self
    }
}

/// A parsed script: variable name → syntax tree, plus custom functions.
///
/// Definition names beginning with `%` declare custom functions; their bodies
/// may use 0-based positional placeholders `$0, $1, …` and every index up to
/// the highest one must occur.
#[derive(Debug, Clone, Default)]
pub struct Script {
    variables: IndexMap<String, SyntaxTree>,
    custom_functions: IndexMap<String, CustomFunction>,
    resolved: IndexMap<String, Value>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and install a batch of definitions. The whole batch is parsed
    /// before anything is installed, so a syntax or type error leaves the
    /// Script unchanged. Re-adding an existing name replaces it.
    pub fn add(&mut self, definitions: IndexMap<String, String>) -> ScriptResult<&mut Self> {
        let (variables, custom_functions) = parse_definitions(&definitions)?;
        self.variables.extend(variables);
        self.custom_functions.extend(custom_functions);
        Ok(self)
    }

    /// Run the resolver and return the resolved snapshot.
    pub fn resolve(&mut self, options: ResolveOptions) -> ScriptResult<IndexMap<String, Value>> {
        let mut initial = self.resolved.clone();
        initial.extend(options.resolved);
        let output = resolver::resolve_variables(
            &self.variables,
            &self.custom_functions,
            initial,
            &options.unresolvable,
        )?;
        if options.update {
            self.resolved = output.clone();
        }
        Ok(output)
    }

    /// Resolve a temporary batch of definitions against this Script without
    /// mutating it: the extras join the existing variables and resolution
    /// cache for one resolution and are then forgotten.
    pub fn resolve_once(
        &self,
        definitions: IndexMap<String, String>,
        unresolvable: &HashSet<String>,
    ) -> ScriptResult<IndexMap<String, Value>> {
        let (variables, custom_functions) = parse_definitions(&definitions)?;
        let mut all_variables = self.variables.clone();
        all_variables.extend(variables);
        let mut all_customs = self.custom_functions.clone();
        all_customs.extend(custom_functions);
        resolver::resolve_variables(
            &all_variables,
            &all_customs,
            self.resolved.clone(),
            unresolvable,
        )
    }

    /// Read a resolved value. Available after `resolve` with `update`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.resolved.get(name)
    }
}

type ParsedDefinitions = (
    IndexMap<String, SyntaxTree>,
    IndexMap<String, CustomFunction>,
);

fn parse_definitions(definitions: &IndexMap<String, String>) -> ScriptResult<ParsedDefinitions> {
    let mut variables = IndexMap::new();
    let mut custom_functions = IndexMap::new();
    for (name, format_string) in definitions {
        if let Some(function_name) = name.strip_prefix('%') {
            if !valid_name(function_name) {
                return Err(ScriptError::StringFormatting(format!(
                    "invalid custom function name %{function_name}"
                )));
            }
            let body = parse(format_string)?;
            custom_functions.insert(
                function_name.to_string(),
                CustomFunction::from_body(function_name, body)?,
            );
        } else {
            if !valid_name(name) {
                return Err(ScriptError::StringFormatting(format!(
                    "invalid variable name {name}"
                )));
            }
            let tree = parse(format_string)?;
            if let Some(idx) = tree.function_args().iter().next() {
                return Err(ScriptError::StringFormatting(format!(
                    "function argument ${idx} may only be used inside a custom function definition"
                )));
            }
            variables.insert(name.clone(), tree);
        }
    }
    Ok((variables, custom_functions))
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|ch| ch.is_alphabetic() || ch == '_')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_')
}
