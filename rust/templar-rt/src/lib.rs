//! Runtime for the templar expression language: dependency-ordered variable
//! resolution and tree evaluation behind the [`Script`] façade.
//!
//! ```
//! use indexmap::IndexMap;
//! use templar_rt::{ResolveOptions, Script, Value};
//!
//! let mut script = Script::new();
//! script
//!     .add(IndexMap::from([
//!         ("who".to_string(), "world".to_string()),
//!         ("greeting".to_string(), "hello {%upper(who)}".to_string()),
//!     ]))
//!     .unwrap();
//! let resolved = script.resolve(ResolveOptions::default()).unwrap();
//! assert_eq!(resolved["greeting"], Value::string("hello WORLD"));
//! ```

mod eval;
mod resolver;
mod script;

pub use script::{ResolveOptions, Script};

pub use templar_core::error::{ScriptError, ScriptResult};
pub use templar_core::functions;
pub use templar_core::types::{ReturnSpec, StaticType, TypeExpr};
pub use templar_core::value::{LambdaRef, MapKey, Value, ValueMap};
