//! Built-in type descriptions for `bool`, `int`, `float`, `double` and
//! `string`.

use std::rc::Rc;

use tinker_types::error::{ConsoleError, Result};

use crate::ops::{BinaryOp, apply_primitive, no_operator};
use crate::reflect::{ParamInfo, TypeBuilder, TypeRef};
use crate::value::{Kind, Value};

/// Operators defined on every numeric type.
const NUMERIC_OPS: [BinaryOp; 11] = [
    BinaryOp::Eq,
    BinaryOp::Ne,
    BinaryOp::Le,
    BinaryOp::Ge,
    BinaryOp::Lt,
    BinaryOp::Gt,
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Rem,
];

const BOOL_OPS: [BinaryOp; 5] = [
    BinaryOp::Eq,
    BinaryOp::Ne,
    BinaryOp::BitAnd,
    BinaryOp::BitOr,
    BinaryOp::BitXor,
];

struct Primitives {
    bool_type: TypeRef,
    int_type: TypeRef,
    float_type: TypeRef,
    double_type: TypeRef,
    string_type: TypeRef,
}

thread_local! {
    static PRIMITIVES: Primitives = Primitives::build();
}

/// The built-in type for a primitive kind.
pub(crate) fn primitive_for_kind(kind: &Kind) -> Option<TypeRef> {
    PRIMITIVES.with(|p| {
        let ty = match kind {
            Kind::Bool => &p.bool_type,
            Kind::Int => &p.int_type,
            Kind::Float => &p.float_type,
            Kind::Double => &p.double_type,
            Kind::Str => &p.string_type,
            Kind::Any | Kind::Void | Kind::Own | Kind::Type(_) => return None,
        };
        Some(Rc::clone(ty))
    })
}

/// Look a primitive type up by its keyword.
pub fn primitive_by_name(name: &str) -> Option<TypeRef> {
    let kind = match name {
        "bool" => Kind::Bool,
        "int" => Kind::Int,
        "float" => Kind::Float,
        "double" => Kind::Double,
        "string" => Kind::Str,
        _ => return None,
    };
    primitive_for_kind(&kind)
}

fn with_ops(mut builder: TypeBuilder, ops: &[BinaryOp], left: &Kind, right: &Kind) -> TypeBuilder {
    for &op in ops {
        builder = builder.operator(op, left.clone(), right.clone(), move |l, r| {
            apply_primitive(op, l, r).unwrap_or_else(|| Err(no_operator(op, l, r)))
        });
    }
    builder
}

fn cast_failure(value: &Value, to: &str) -> ConsoleError {
    ConsoleError::TypeMismatch {
        expected: to.to_string(),
        found: format!("{} \"{value}\"", value.type_name()),
    }
}

fn to_string(v: &Value) -> Result<Value> {
    Ok(Value::Str(v.to_string()))
}

impl Primitives {
    fn build() -> Self {
        let bool_type = with_ops(TypeBuilder::new("bool"), &BOOL_OPS, &Kind::Bool, &Kind::Bool)
            .conversion(Kind::Int, |v| Ok(Value::Int(i64::from(v.as_bool()?))))
            .conversion(Kind::Str, to_string)
            .build();

        // Casts between numeric types truncate.
        let int_type = with_ops(TypeBuilder::new("int"), &BinaryOp::ALL, &Kind::Int, &Kind::Int);
        let int_type = with_ops(int_type, &NUMERIC_OPS, &Kind::Int, &Kind::Double)
            .static_field("MaxValue", Kind::Int, || Value::Int(i64::MAX), None)
            .static_field("MinValue", Kind::Int, || Value::Int(i64::MIN), None)
            .conversion(Kind::Float, |v| Ok(Value::Float(v.as_int()? as f32)))
            .conversion(Kind::Double, |v| Ok(Value::Double(v.as_int()? as f64)))
            .conversion(Kind::Bool, |v| Ok(Value::Bool(v.as_int()? != 0)))
            .conversion(Kind::Str, to_string)
            .build();

        let float_type = with_ops(TypeBuilder::new("float"), &NUMERIC_OPS, &Kind::Float, &Kind::Double)
            .static_field("MaxValue", Kind::Float, || Value::Float(f32::MAX), None)
            .static_field("MinValue", Kind::Float, || Value::Float(f32::MIN), None)
            .conversion(Kind::Int, |v| Ok(Value::Int(v.as_float()? as i64)))
            .conversion(Kind::Double, |v| Ok(Value::Double(v.as_double()?)))
            .conversion(Kind::Str, to_string)
            .build();

        let double_type = with_ops(TypeBuilder::new("double"), &NUMERIC_OPS, &Kind::Double, &Kind::Double)
            .static_field("MaxValue", Kind::Double, || Value::Double(f64::MAX), None)
            .static_field("MinValue", Kind::Double, || Value::Double(f64::MIN), None)
            .conversion(Kind::Int, |v| Ok(Value::Int(v.as_double()? as i64)))
            .conversion(Kind::Float, |v| Ok(Value::Float(v.as_double()? as f32)))
            .conversion(Kind::Str, to_string)
            .build();

        let string_type = TypeBuilder::new("string")
            .operator(BinaryOp::Add, Kind::Str, Kind::Any, |l, r| {
                Ok(Value::Str(format!("{l}{r}")))
            })
            .operator(BinaryOp::Add, Kind::Any, Kind::Str, |l, r| {
                Ok(Value::Str(format!("{l}{r}")))
            })
            .operator(BinaryOp::Eq, Kind::Str, Kind::Str, |l, r| Ok(Value::Bool(l == r)))
            .operator(BinaryOp::Ne, Kind::Str, Kind::Str, |l, r| Ok(Value::Bool(l != r)))
            .raw_property("Length", Kind::Int, |v| {
                Ok(Value::Int(v.as_str()?.chars().count() as i64))
            })
            .raw_method("ToUpper", Vec::new(), Kind::Str, |v, _| {
                Ok(Value::Str(v.as_str()?.to_uppercase()))
            })
            .raw_method("ToLower", Vec::new(), Kind::Str, |v, _| {
                Ok(Value::Str(v.as_str()?.to_lowercase()))
            })
            .raw_method("Trim", Vec::new(), Kind::Str, |v, _| {
                Ok(Value::Str(v.as_str()?.trim().to_string()))
            })
            .raw_method(
                "Contains",
                vec![ParamInfo::new("value", Kind::Str)],
                Kind::Bool,
                |v, args| Ok(Value::Bool(v.as_str()?.contains(args[0].as_str()?))),
            )
            .conversion(Kind::Int, |v| {
                v.convert_to(&Kind::Int)
                    .ok_or_else(|| cast_failure(v, "int"))
            })
            .conversion(Kind::Float, |v| {
                v.convert_to(&Kind::Float)
                    .ok_or_else(|| cast_failure(v, "float"))
            })
            .conversion(Kind::Double, |v| {
                v.convert_to(&Kind::Double)
                    .ok_or_else(|| cast_failure(v, "double"))
            })
            .conversion(Kind::Bool, |v| {
                v.convert_to(&Kind::Bool)
                    .ok_or_else(|| cast_failure(v, "bool"))
            })
            .build();

        Self {
            bool_type,
            int_type,
            float_type,
            double_type,
            string_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Member;

    fn apply_on(ty: &TypeRef, op: BinaryOp, l: Value, r: Value) -> Option<Result<Value>> {
        ty.operators(op)
            .into_iter()
            .find(|(owner, o)| owner.resolve(&o.left).accepts(&l) && owner.resolve(&o.right).accepts(&r))
            .map(|(_, o)| o.apply(&l, &r))
    }

    #[test]
    fn lookup_by_keyword() {
        for name in ["bool", "int", "float", "double", "string"] {
            assert_eq!(primitive_by_name(name).unwrap().name(), name);
        }
        assert!(primitive_by_name("Int32").is_none());
    }

    #[test]
    fn int_table_handles_mixed_operands() {
        let int = primitive_by_name("int").unwrap();
        let sum = apply_on(&int, BinaryOp::Add, Value::Int(1), Value::Float(0.5));
        assert_eq!(sum.unwrap().unwrap(), Value::Float(1.5));
        let shifted = apply_on(&int, BinaryOp::Shl, Value::Int(1), Value::Int(3));
        assert_eq!(shifted.unwrap().unwrap(), Value::Int(8));
        assert!(apply_on(&int, BinaryOp::Shl, Value::Int(1), Value::Float(1.0)).is_none());
    }

    #[test]
    fn string_table_concatenates_either_side() {
        let string = primitive_by_name("string").unwrap();
        let r = apply_on(&string, BinaryOp::Add, Value::Int(1), Value::from("x"));
        assert_eq!(r.unwrap().unwrap(), Value::from("1x"));
    }

    #[test]
    fn casts_between_numbers_truncate() {
        let float = primitive_by_name("float").unwrap();
        let to_int = float.conversion_to(&Kind::Int).unwrap();
        assert_eq!(to_int.convert(&Value::Float(2.7)).unwrap(), Value::Int(2));
        assert_eq!(to_int.convert(&Value::Float(-2.7)).unwrap(), Value::Int(-2));
    }

    #[test]
    fn string_parse_failure_is_reported() {
        let string = primitive_by_name("string").unwrap();
        let to_int = string.conversion_to(&Kind::Int).unwrap();
        assert_eq!(to_int.convert(&Value::from("12")).unwrap(), Value::Int(12));
        assert!(to_int.convert(&Value::from("twelve")).is_err());
    }

    #[test]
    fn string_members() {
        let string = primitive_by_name("string").unwrap();
        let Some(Member::Property(len)) = string.find_member("Length") else {
            panic!("Length should be a property");
        };
        assert_eq!(len.get(&Value::from("h\u{e9}llo")).unwrap(), Value::Int(5));
        let (_, upper) = string.methods_named("ToUpper")[0];
        assert_eq!(upper.invoke(&Value::from("ab"), &[]).unwrap(), Value::from("AB"));
    }

    #[test]
    fn int_limits() {
        let int = primitive_by_name("int").unwrap();
        let Some(Member::Field(max)) = int.find_member("MaxValue") else {
            panic!("MaxValue should be a field");
        };
        assert!(max.is_static);
        assert_eq!(max.get(&Value::Null).unwrap(), Value::Int(i64::MAX));
    }
}
