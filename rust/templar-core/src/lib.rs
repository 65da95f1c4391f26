//! Core of the templar expression language: the runtime value universe, the
//! static type system, the common error hierarchy and the typed function
//! registry with its built-in families.
//!
//! This crate has no parsing or resolution logic; `templar-compiler` turns
//! format strings into syntax trees and `templar-rt` evaluates them.

pub mod error;
pub mod functions;
pub mod types;
pub mod value;

pub use error::{ScriptError, ScriptResult};
pub use functions::{FunctionHandler, FunctionSpec, Params, RegistrationError, Registry};
pub use types::{ReturnSpec, StaticType, TypeExpr};
pub use value::{LambdaRef, MapKey, Value, ValueMap};
