//! Runtime values and declared kinds.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tinker_types::error::{ConsoleError, Result};

use crate::primitives;
use crate::reflect::{ObjectRef, Reflect, TypeRef};

/// A value produced by evaluation.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Enum(EnumValue),
    /// A shared host object.
    Object(ObjectRef),
    /// A type used as a value: static member access, casts, construction.
    Type(TypeRef),
}

/// A value of an enumerated type.
#[derive(Clone)]
pub struct EnumValue {
    pub ty: TypeRef,
    pub ordinal: i64,
}

impl EnumValue {
    /// Variant name, if the ordinal is a declared variant.
    pub fn name(&self) -> Option<&str> {
        self.ty.variant_name(self.ordinal)
    }
}

/// The declared kind of a field, property, parameter or return value.
#[derive(Clone)]
pub enum Kind {
    /// Accepts any value.
    Any,
    /// No value (method return only).
    Void,
    Bool,
    Int,
    Float,
    Double,
    Str,
    /// An object or enum type.
    Type(TypeRef),
    /// The type declaring the member. Lets a type refer to itself before it
    /// has been built.
    Own,
}

impl Kind {
    /// The kind denoted by a type value. Primitive types map to their
    /// primitive kind.
    pub fn from_type(ty: &TypeRef) -> Kind {
        match ty.name() {
            "bool" => Kind::Bool,
            "int" => Kind::Int,
            "float" => Kind::Float,
            "double" => Kind::Double,
            "string" => Kind::Str,
            _ => Kind::Type(Rc::clone(ty)),
        }
    }

    /// The type describing this kind, if any.
    pub fn type_info(&self) -> Option<TypeRef> {
        match self {
            Kind::Type(t) => Some(Rc::clone(t)),
            other => primitives::primitive_for_kind(other),
        }
    }
}

impl Kind {
    /// Whether `value` can be passed for this kind without an explicit
    /// conversion: assignable as-is, or a widening numeric promotion.
    pub fn accepts(&self, value: &Value) -> bool {
        value.is_assignable_to(self)
            || matches!(
                (value, self),
                (Value::Int(_), Kind::Float | Kind::Double) | (Value::Float(_), Kind::Double)
            )
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Kind::Type(a), Kind::Type(b)) => a.name() == b.name(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Any => f.write_str("any"),
            Kind::Void => f.write_str("void"),
            Kind::Bool => f.write_str("bool"),
            Kind::Int => f.write_str("int"),
            Kind::Float => f.write_str("float"),
            Kind::Double => f.write_str("double"),
            Kind::Str => f.write_str("string"),
            Kind::Type(t) => f.write_str(t.name()),
            Kind::Own => f.write_str("Self"),
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({self})")
    }
}

impl Value {
    /// Wrap a host object.
    pub fn object<T: Reflect>(value: T) -> Self {
        Value::Object(Rc::new(RefCell::new(value)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type whose members and operators apply to this value. `None` for
    /// `null` and for type values.
    pub fn type_info(&self) -> Option<TypeRef> {
        match self {
            Value::Null | Value::Type(_) => None,
            Value::Bool(_) => primitives::primitive_for_kind(&Kind::Bool),
            Value::Int(_) => primitives::primitive_for_kind(&Kind::Int),
            Value::Float(_) => primitives::primitive_for_kind(&Kind::Float),
            Value::Double(_) => primitives::primitive_for_kind(&Kind::Double),
            Value::Str(_) => primitives::primitive_for_kind(&Kind::Str),
            Value::Enum(e) => Some(Rc::clone(&e.ty)),
            Value::Object(obj) => obj.try_borrow().ok().map(|o| o.type_info()),
        }
    }

    /// Name of the value's type, for messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Type(t) => format!("type {}", t.name()),
            other => other
                .type_info()
                .map_or_else(|| "object".to_string(), |t| t.name().to_string()),
        }
    }

    /// Whether the value can be stored in a slot of `kind` as-is.
    pub fn is_assignable_to(&self, kind: &Kind) -> bool {
        match (self, kind) {
            (_, Kind::Any) => true,
            (Value::Null, Kind::Str) => true,
            (Value::Null, Kind::Type(t)) => !t.is_enum(),
            (Value::Bool(_), Kind::Bool)
            | (Value::Int(_), Kind::Int)
            | (Value::Float(_), Kind::Float)
            | (Value::Double(_), Kind::Double)
            | (Value::Str(_), Kind::Str) => true,
            (Value::Enum(e), Kind::Type(t)) => e.ty.is_subtype_of(t),
            (Value::Object(_), Kind::Type(t)) => {
                self.type_info().is_some_and(|own| own.is_subtype_of(t))
            },
            _ => false,
        }
    }

    /// Standard value conversion to `kind`: numeric widening and narrowing,
    /// string parsing and formatting, enum ordinals and names.
    pub fn convert_to(&self, kind: &Kind) -> Option<Value> {
        if self.is_assignable_to(kind) {
            return Some(self.clone());
        }
        match (self, kind) {
            (Value::Int(i), Kind::Float) => Some(Value::Float(*i as f32)),
            (Value::Int(i), Kind::Double) => Some(Value::Double(*i as f64)),
            (Value::Int(i), Kind::Bool) => Some(Value::Bool(*i != 0)),
            (Value::Float(f), Kind::Int) => float_to_int(f64::from(*f)),
            (Value::Float(f), Kind::Double) => Some(Value::Double(f64::from(*f))),
            (Value::Float(f), Kind::Bool) => Some(Value::Bool(*f != 0.0)),
            (Value::Double(d), Kind::Int) => float_to_int(*d),
            (Value::Double(d), Kind::Float) => Some(Value::Float(*d as f32)),
            (Value::Double(d), Kind::Bool) => Some(Value::Bool(*d != 0.0)),
            (Value::Bool(b), Kind::Int) => Some(Value::Int(i64::from(*b))),
            (Value::Bool(b), Kind::Float) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
            (Value::Bool(b), Kind::Double) => Some(Value::Double(if *b { 1.0 } else { 0.0 })),
            (Value::Str(s), Kind::Int) => s.trim().parse().ok().map(Value::Int),
            (Value::Str(s), Kind::Float) => s.trim().parse().ok().map(Value::Float),
            (Value::Str(s), Kind::Double) => s.trim().parse().ok().map(Value::Double),
            (Value::Str(s), Kind::Bool) => parse_bool(s).map(Value::Bool),
            (Value::Enum(e), Kind::Int) => Some(Value::Int(e.ordinal)),
            (Value::Int(i), Kind::Type(t)) if t.is_enum() => Some(Value::Enum(EnumValue {
                ty: Rc::clone(t),
                ordinal: *i,
            })),
            (Value::Str(s), Kind::Type(t)) if t.is_enum() => {
                t.variant_ordinal(s.trim()).map(|ordinal| {
                    Value::Enum(EnumValue {
                        ty: Rc::clone(t),
                        ordinal,
                    })
                })
            },
            (
                Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Double(_) | Value::Enum(_),
                Kind::Str,
            ) => Some(Value::Str(self.to_string())),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            Value::Enum(e) => Ok(e.ordinal),
            other => Err(mismatch("int", other)),
        }
    }

    /// Float value, widening integers.
    pub fn as_float(&self) -> Result<f32> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f32),
            other => Err(mismatch("float", other)),
        }
    }

    /// Double value, widening integers and floats.
    pub fn as_double(&self) -> Result<f64> {
        match self {
            Value::Double(d) => Ok(*d),
            Value::Float(f) => Ok(f64::from(*f)),
            Value::Int(i) => Ok(*i as f64),
            other => Err(mismatch("double", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(mismatch("string", other)),
        }
    }

    pub fn as_object(&self) -> Result<&ObjectRef> {
        match self {
            Value::Object(obj) => Ok(obj),
            other => Err(mismatch("object", other)),
        }
    }

    pub fn as_enum(&self) -> Result<&EnumValue> {
        match self {
            Value::Enum(e) => Ok(e),
            other => Err(mismatch("enum", other)),
        }
    }
}

fn mismatch(expected: &str, found: &Value) -> ConsoleError {
    ConsoleError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_name(),
    }
}

fn float_to_int(f: f64) -> Option<Value> {
    f.is_finite()
        .then(|| Value::Int(f.round_ties_even() as i64))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Double(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Enum(e) => match e.name() {
                Some(name) => f.write_str(name),
                None => write!(f, "{}", e.ordinal),
            },
            Value::Object(obj) => match obj.try_borrow() {
                Ok(o) => f.write_str(&o.describe()),
                Err(_) => f.write_str("<object in use>"),
            },
            Value::Type(t) => f.write_str(t.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Null => f.write_str("Null"),
            other => write!(f, "{}({other})", other.type_name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a.ty.name() == b.ty.name() && a.ordinal == b.ordinal,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}
