//! Binary operators and their primitive implementations.

use std::cmp::Ordering;
use std::fmt;

use tinker_types::error::{ConsoleError, Result};

use crate::value::Value;

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 16] = [
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Le,
        BinaryOp::Ge,
        BinaryOp::Lt,
        BinaryOp::Gt,
        BinaryOp::Shl,
        BinaryOp::Shr,
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
        BinaryOp::BitAnd,
        BinaryOp::BitOr,
        BinaryOp::BitXor,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    /// Operators that may be combined with `=` into a compound assignment.
    pub fn has_compound_form(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

pub(crate) fn no_operator(op: BinaryOp, left: &Value, right: &Value) -> ConsoleError {
    ConsoleError::NoOperator {
        op: op.symbol().to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn is_comparison(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
    )
}

/// Evaluate a comparison operator. Unordered operands (NaN) compare unequal.
fn compare(op: BinaryOp, ord: Option<Ordering>) -> Option<bool> {
    if !is_comparison(op) {
        return None;
    }
    let Some(ord) = ord else {
        return Some(op == BinaryOp::Ne);
    };
    Some(match op {
        BinaryOp::Eq => ord == Ordering::Equal,
        BinaryOp::Ne => ord != Ordering::Equal,
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::Le => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
    })
}

/// Numeric operands after promotion.
enum Promoted {
    Int(i64, i64),
    Float(f32, f32),
    Double(f64, f64),
}

fn promote(left: &Value, right: &Value) -> Option<Promoted> {
    use Value::{Double, Float, Int};
    Some(match (left, right) {
        (Int(a), Int(b)) => Promoted::Int(*a, *b),
        (Double(a), Double(b)) => Promoted::Double(*a, *b),
        (Double(a), Float(b)) => Promoted::Double(*a, f64::from(*b)),
        (Float(a), Double(b)) => Promoted::Double(f64::from(*a), *b),
        (Double(a), Int(b)) => Promoted::Double(*a, *b as f64),
        (Int(a), Double(b)) => Promoted::Double(*a as f64, *b),
        (Float(a), Float(b)) => Promoted::Float(*a, *b),
        (Float(a), Int(b)) => Promoted::Float(*a, *b as f32),
        (Int(a), Float(b)) => Promoted::Float(*a as f32, *b),
        _ => return None,
    })
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Option<Result<Value>> {
    let shift = (b & 63) as u32;
    let v = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Some(Err(ConsoleError::DivideByZero)),
        BinaryOp::Div => a.wrapping_div(b),
        BinaryOp::Rem => a.wrapping_rem(b),
        BinaryOp::Shl => a.wrapping_shl(shift),
        BinaryOp::Shr => a.wrapping_shr(shift),
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        cmp => return compare(cmp, Some(a.cmp(&b))).map(|r| Ok(Value::Bool(r))),
    };
    Some(Ok(Value::Int(v)))
}

fn float_op<T>(op: BinaryOp, a: T, b: T, wrap: fn(T) -> Value) -> Option<Result<Value>>
where
    T: Copy
        + PartialOrd
        + std::ops::Add<Output = T>
        + std::ops::Sub<Output = T>
        + std::ops::Mul<Output = T>
        + std::ops::Div<Output = T>
        + std::ops::Rem<Output = T>,
{
    let v = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        cmp => return compare(cmp, a.partial_cmp(&b)).map(|r| Ok(Value::Bool(r))),
    };
    Some(Ok(wrap(v)))
}

/// Apply `op` to primitive operands: numbers (promoted int < float <
/// double), booleans and strings. `+` concatenates when either side is a
/// string. `None` if the operator is not defined for the operands.
pub(crate) fn apply_primitive(op: BinaryOp, left: &Value, right: &Value) -> Option<Result<Value>> {
    if op == BinaryOp::Add
        && (matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)))
    {
        return Some(Ok(Value::Str(format!("{left}{right}"))));
    }
    if matches!(op, BinaryOp::Eq | BinaryOp::Ne) && (left.is_null() || right.is_null()) {
        return Some(Ok(Value::Bool((left == right) == (op == BinaryOp::Eq))));
    }

    match (left, right) {
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Eq => Some(Ok(Value::Bool(a == b))),
            BinaryOp::Ne => Some(Ok(Value::Bool(a != b))),
            _ => None,
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::Eq => Some(Ok(Value::Bool(a == b))),
            BinaryOp::Ne => Some(Ok(Value::Bool(a != b))),
            BinaryOp::BitAnd => Some(Ok(Value::Bool(a & b))),
            BinaryOp::BitOr => Some(Ok(Value::Bool(a | b))),
            BinaryOp::BitXor => Some(Ok(Value::Bool(a ^ b))),
            _ => None,
        },
        _ => match promote(left, right) {
            Some(Promoted::Int(a, b)) => int_op(op, a, b),
            Some(Promoted::Float(a, b)) => float_op(op, a, b, Value::Float),
            Some(Promoted::Double(a, b)) => float_op(op, a, b, Value::Double),
            None => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(op: BinaryOp, l: impl Into<Value>, r: impl Into<Value>) -> Result<Value> {
        let (l, r) = (l.into(), r.into());
        apply_primitive(op, &l, &r).unwrap_or_else(|| Err(no_operator(op, &l, &r)))
    }

    #[test]
    fn symbols_round_trip() {
        for op in BinaryOp::ALL {
            assert_eq!(BinaryOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(BinaryOp::from_symbol("=>"), None);
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(apply(BinaryOp::Add, 1, 2).unwrap(), Value::Int(3));
        assert_eq!(apply(BinaryOp::Sub, 5, 4).unwrap(), Value::Int(1));
        assert_eq!(apply(BinaryOp::Div, 7, 2).unwrap(), Value::Int(3));
        assert_eq!(apply(BinaryOp::Rem, 7, 2).unwrap(), Value::Int(1));
        assert_eq!(apply(BinaryOp::Shl, 1, 4).unwrap(), Value::Int(16));
        assert_eq!(apply(BinaryOp::BitXor, 6, 3).unwrap(), Value::Int(5));
    }

    #[test]
    fn integer_division_by_zero_fails() {
        assert!(matches!(
            apply(BinaryOp::Div, 1, 0),
            Err(ConsoleError::DivideByZero)
        ));
        assert!(matches!(
            apply(BinaryOp::Rem, 1, 0),
            Err(ConsoleError::DivideByZero)
        ));
    }

    #[test]
    fn float_division_by_zero_is_infinite() {
        let v = apply(BinaryOp::Div, 1.0f32, 0).unwrap();
        assert_eq!(v, Value::Float(f32::INFINITY));
    }

    #[test]
    fn promotion() {
        assert_eq!(apply(BinaryOp::Add, 1, 0.5f32).unwrap(), Value::Float(1.5));
        assert_eq!(apply(BinaryOp::Mul, 2.0f32, 0.25f64).unwrap(), Value::Double(0.5));
        assert_eq!(apply(BinaryOp::Lt, 1, 1.5f64).unwrap(), Value::Bool(true));
    }

    #[test]
    fn comparisons() {
        assert_eq!(apply(BinaryOp::Eq, 2, 2).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Ne, 2, 2).unwrap(), Value::Bool(false));
        assert_eq!(apply(BinaryOp::Ge, 3, 2).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Le, 3, 2).unwrap(), Value::Bool(false));
    }

    #[test]
    fn nan_comparisons() {
        assert_eq!(apply(BinaryOp::Eq, f32::NAN, f32::NAN).unwrap(), Value::Bool(false));
        assert_eq!(apply(BinaryOp::Ne, f32::NAN, 1.0f32).unwrap(), Value::Bool(true));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(apply(BinaryOp::Add, "hp: ", 10).unwrap(), Value::from("hp: 10"));
        assert_eq!(apply(BinaryOp::Add, 1, "x").unwrap(), Value::from("1x"));
        assert_eq!(apply(BinaryOp::Eq, "a", "a").unwrap(), Value::Bool(true));
    }

    #[test]
    fn null_equality() {
        assert_eq!(apply(BinaryOp::Eq, "a", Value::Null).unwrap(), Value::Bool(false));
        assert_eq!(apply(BinaryOp::Ne, Value::Null, 1).unwrap(), Value::Bool(true));
        assert_eq!(apply(BinaryOp::Eq, Value::Null, Value::Null).unwrap(), Value::Bool(true));
    }

    #[test]
    fn boolean_logic() {
        assert_eq!(apply(BinaryOp::BitAnd, true, false).unwrap(), Value::Bool(false));
        assert_eq!(apply(BinaryOp::BitOr, true, false).unwrap(), Value::Bool(true));
    }

    #[test]
    fn unsupported_combinations_fail() {
        let err = apply(BinaryOp::Sub, "a", "b").unwrap_err();
        assert_eq!(
            err.to_string(),
            "operator - is not defined for string and string"
        );
        assert!(apply(BinaryOp::Shl, 1.0f32, 2).is_err());
        assert!(apply(BinaryOp::Add, true, 1).is_err());
    }
}
