//! Static types for function signatures and the argument compatibility rules
//! used by the type checker.

use serde::Serialize;
use std::fmt;

/// A type expression in a function signature.
///
/// `Numeric` and `Hashable` are named unions (`Integer | Float` and
/// `Integer | String | Boolean` respectively); they stay first-class variants
/// so diagnostics print the name the signature was written with. Ad-hoc
/// unions only appear as computed return types (e.g. the two branches of
/// `%if`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeExpr {
    Any,
    Integer,
    Float,
    Boolean,
    String,
    Array,
    Map,
    Numeric,
    Hashable,
    /// A lambda reference, invoked with the given number of arguments.
    Lambda(usize),
    /// A parameter that may be omitted; legal only in the tail of a fixed
    /// signature.
    Optional(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

impl TypeExpr {
    /// Build a union, flattening nested unions and dropping duplicates.
    /// A single surviving member collapses to that member.
    pub fn union(members: Vec<TypeExpr>) -> TypeExpr {
        let mut flat: Vec<TypeExpr> = Vec::new();
        for member in members {
            match member {
                TypeExpr::Union(inner) => {
                    for m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                }
                m => {
                    if !flat.contains(&m) {
                        flat.push(m);
                    }
                }
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            TypeExpr::Union(flat)
        }
    }

    /// Whether a value of static type `actual` may be passed where `self` is
    /// expected.
    pub fn accepts(&self, actual: &StaticType) -> bool {
        match actual {
            StaticType::Unconstrained => true,
            StaticType::Of(t) => self.accepts_concrete(t),
        }
    }

    pub fn accepts_concrete(&self, actual: &TypeExpr) -> bool {
        match self {
            TypeExpr::Any => true,
            TypeExpr::Optional(inner) => inner.accepts_concrete(actual),
            TypeExpr::Numeric => matches!(
                actual,
                TypeExpr::Integer | TypeExpr::Float | TypeExpr::Numeric
            ),
            TypeExpr::Hashable => matches!(
                actual,
                TypeExpr::Integer | TypeExpr::String | TypeExpr::Boolean | TypeExpr::Hashable
            ),
            // Arity of lambda references is not always known statically
            // (custom functions may be defined in a later batch), so only the
            // kind is checked here; arity is enforced at evaluation.
            TypeExpr::Lambda(_) => matches!(actual, TypeExpr::Lambda(_)),
            TypeExpr::Union(members) => match actual {
                TypeExpr::Union(actual_members) => {
                    members.len() == actual_members.len()
                        && actual_members.iter().all(|m| members.contains(m))
                }
                other => members.iter().any(|m| m.accepts_concrete(other)),
            },
            concrete => match actual {
                TypeExpr::Union(actual_members) => {
                    actual_members.iter().all(|m| concrete.accepts_concrete(m))
                }
                other => concrete == other,
            },
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeExpr::Optional(_))
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self, TypeExpr::Lambda(_))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Any => f.write_str("Any"),
            TypeExpr::Integer => f.write_str("Integer"),
            TypeExpr::Float => f.write_str("Float"),
            TypeExpr::Boolean => f.write_str("Boolean"),
            TypeExpr::String => f.write_str("String"),
            TypeExpr::Array => f.write_str("Array"),
            TypeExpr::Map => f.write_str("Map"),
            TypeExpr::Numeric => f.write_str("Numeric"),
            TypeExpr::Hashable => f.write_str("Hashable"),
            TypeExpr::Lambda(_) => f.write_str("Lambda"),
            TypeExpr::Optional(inner) => write!(f, "Optional[{inner}]"),
            TypeExpr::Union(members) => {
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

/// The statically known type of an argument expression.
///
/// Variables and custom-function calls are unconstrained: they satisfy any
/// expected parameter and are re-checked with their concrete runtime type at
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StaticType {
    Unconstrained,
    Of(TypeExpr),
}

impl StaticType {
    /// The union of several static types. Any unconstrained contributor makes
    /// the whole union unconstrained.
    pub fn union_of(types: impl IntoIterator<Item = StaticType>) -> StaticType {
        let mut members = Vec::new();
        for t in types {
            match t {
                StaticType::Unconstrained => return StaticType::Unconstrained,
                StaticType::Of(t) => members.push(t),
            }
        }
        StaticType::Of(TypeExpr::union(members))
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Unconstrained => f.write_str("Any"),
            StaticType::Of(t) => write!(f, "{t}"),
        }
    }
}

/// Declared return type of a registered function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReturnSpec {
    Fixed(TypeExpr),
    /// Generic return marker: the return type is the union of the static
    /// types of the arguments at the given positions (`%if` returns
    /// `RetA | RetB` for its two branches).
    FromArgs(Vec<usize>),
    /// The function never returns (`%throw`).
    Never,
}
