//! Parsing and static checking for the templar expression language: format
//! strings in, type-checked syntax trees out.

pub mod ast;
pub mod parser;
pub mod typecheck;

pub use ast::{CallKind, CustomFunction, Expr, FunctionCall, SyntaxTree};
pub use parser::parse;
