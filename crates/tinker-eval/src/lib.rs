//! Expression evaluation against a live object graph.
//!
//! Host types describe themselves through an explicit introspection registry
//! ([`TypeInfo`], built with [`TypeBuilder`]). An expression line is
//! tokenized, parsed into an [`Expr`] tree and evaluated against a root
//! [`Value`] that is passed explicitly through every call.
//!
//! Binary operators have no precedence: an operand is followed by at most one
//! operator whose right side is the whole rest of the line, so `5-2*2` is
//! `5-(2*2)`.

mod eval;
pub mod lexer;
pub mod ops;
pub mod parser;
mod primitives;
pub mod reflect;
pub mod scan;
mod value;

/// Options controlling evaluation.
pub use eval::EvalOptions;
/// Evaluates expression lines.
pub use eval::Evaluator;
/// Result of evaluating a line: a value or a member listing.
pub use eval::Outcome;
/// Binary operators.
pub use ops::BinaryOp;
/// Parsed expression tree.
pub use parser::{Expr, Line, Literal, parse};
/// Primitive type lookup by keyword (`int`, `float`, ...).
pub use primitives::primitive_by_name;
/// Introspection registry.
pub use reflect::{
    MemberDescriptor, MemberKind, MethodInfo, ObjectRef, ParamInfo, Reflect, TypeBuilder, TypeInfo,
    TypeRef,
};
/// Runtime values and declared kinds.
pub use value::{EnumValue, Kind, Value};
