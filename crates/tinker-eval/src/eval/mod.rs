//! Tree-walking evaluation of parsed lines.

use std::rc::Rc;

use tinker_types::error::{ConsoleError, Result};

use crate::ops::{BinaryOp, no_operator};
use crate::parser::{Expr, Literal, parse};
use crate::primitives::primitive_by_name;
use crate::reflect::{Member, MemberDescriptor, MethodInfo, ParamInfo, TypeInfo, TypeRef};
use crate::value::{EnumValue, Kind, Value};


/// Options controlling evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    /// Fail with [`ConsoleError::NoOperator`] when neither operand type
    /// implements an operator. When off, the right operand is returned.
    pub strict_operators: bool,
}

/// Result of evaluating a line.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Value(Value),
    /// The line ended with `@`: the members of the evaluated value.
    Members(Vec<MemberDescriptor>),
}

/// Evaluates expression lines against a root value.
#[derive(Debug, Default)]
pub struct Evaluator {
    options: EvalOptions,
}

impl Evaluator {
    pub fn new(options: EvalOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EvalOptions {
        self.options
    }

    /// Parse and evaluate `source`. Unqualified names resolve against
    /// `root`. Failures carry the evaluation frames active at the point of
    /// failure, innermost first.
    pub fn evaluate(&self, source: &str, root: &Value) -> Result<Outcome> {
        log::debug!("Evaluating {source:?}");
        let line = parse(source)?;
        let mut cx = Context {
            options: self.options,
            root,
            frames: Vec::new(),
        };
        let value = match &line.expr {
            Some(expr) => cx.eval(expr)?,
            None if line.introspect => root.clone(),
            None => Value::Null,
        };
        if line.introspect {
            Ok(Outcome::Members(Self::members_of(&value)))
        } else {
            Ok(Outcome::Value(value))
        }
    }

    /// Members of a value. For a type value only its static members and
    /// nested types are listed.
    pub fn members_of(value: &Value) -> Vec<MemberDescriptor> {
        match value {
            Value::Null => Vec::new(),
            Value::Type(ty) => ty
                .list_members()
                .into_iter()
                .filter(|m| m.is_static)
                .collect(),
            other => other
                .type_info()
                .map(|ty| ty.list_members())
                .unwrap_or_default(),
        }
    }
}

/// State of one evaluation: the root and the active frames.
struct Context<'a> {
    options: EvalOptions,
    root: &'a Value,
    frames: Vec<String>,
}

impl<'a> Context<'a> {
    /// Run `f` inside a frame named after `expr`.
    fn framed(&mut self, expr: &Expr, f: impl FnOnce(&mut Self) -> Result<Value>) -> Result<Value> {
        self.frames.push(expr.to_string());
        let result = f(self).map_err(|e| e.traced(|| self.frames.iter().rev().cloned().collect()));
        self.frames.pop();
        result
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal(lit)),
            Expr::Group(inner) => self.eval(inner),
            // `(T)-x` lexes as a subtraction; it is a cast when `T` is a type.
            Expr::Binary {
                op: BinaryOp::Sub,
                left,
                right,
            } if is_name_chain_group(left) => match self.eval(left)? {
                Value::Type(target) => self.framed(expr, |cx| {
                    let value = cx.eval_negated(right)?;
                    cast(value, &target)
                }),
                left => {
                    let right = self.eval(right)?;
                    self.apply_operator(BinaryOp::Sub, &left, &right)
                },
            },
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.apply_operator(*op, &left, &right)
            },
            Expr::Name { name, args } => self.framed(expr, |cx| {
                let root: &'a Value = cx.root;
                match args {
                    Some(args) => {
                        let args = cx.eval_args(args)?;
                        call_method(root, name, &args)
                    },
                    None => read_name(root, name),
                }
            }),
            Expr::Member { target, name, args } => self.framed(expr, |cx| {
                let receiver = cx.eval(target)?;
                match args {
                    Some(args) => {
                        let args = cx.eval_args(args)?;
                        call_method(&receiver, name, &args)
                    },
                    None => read_member(&receiver, name),
                }
            }),
            Expr::Cast { ty, operand } => self.framed(expr, |cx| {
                let target = cx.eval_type(ty)?;
                let value = cx.eval(operand)?;
                cast(value, &target)
            }),
            Expr::New { ty, args } => self.framed(expr, |cx| {
                let target = cx.eval_type(ty)?;
                let args = cx.eval_args(args)?;
                construct(&target, &args)
            }),
            Expr::Assign { op, target, value } => {
                self.framed(expr, |cx| cx.assign(*op, target, value))
            },
        }
    }

    /// Evaluate `expr` with its leading operand negated, so `5 + 1` yields
    /// `-5 + 1`.
    fn eval_negated(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Binary { op, left, right } => {
                let left = self.eval_negated(left)?;
                let right = self.eval(right)?;
                self.apply_operator(*op, &left, &right)
            },
            other => negate(self.eval(other)?),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn eval_type(&mut self, expr: &Expr) -> Result<TypeRef> {
        match self.eval(expr)? {
            Value::Type(ty) => Ok(ty),
            _ => Err(ConsoleError::NotAType(expr.to_string())),
        }
    }

    fn assign(&mut self, op: Option<BinaryOp>, target: &Expr, value: &Expr) -> Result<Value> {
        let (receiver, name) = match target {
            Expr::Name { name, args: None } => (self.root.clone(), name),
            Expr::Member {
                target,
                name,
                args: None,
            } => (self.eval(target)?, name),
            other => return Err(ConsoleError::Eval(format!("cannot assign to '{other}'"))),
        };
        let mut value = self.eval(value)?;
        if let Some(op) = op {
            let current = read_member(&receiver, name)?;
            value = self.apply_operator(op, &current, &value)?;
        }
        write_member(&receiver, name, value)
    }

    /// Ask the left operand's type, then the right operand's type, for an
    /// implementation of `op`.
    fn apply_operator(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
        for operand in [left, right] {
            let Some(ty) = operand.type_info() else {
                continue;
            };
            let found = ty.operators(op).into_iter().find(|(owner, o)| {
                owner.resolve(&o.left).accepts(left) && owner.resolve(&o.right).accepts(right)
            });
            if let Some((_, implementation)) = found {
                return implementation.apply(left, right);
            }
        }
        // Equality without an overload compares identity.
        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            return Ok(Value::Bool((left == right) == (op == BinaryOp::Eq)));
        }
        if self.options.strict_operators {
            return Err(no_operator(op, left, right));
        }
        log::debug!(
            "operator {op} not defined for {} and {}, yielding the right operand",
            left.type_name(),
            right.type_name()
        );
        Ok(right.clone())
    }
}

fn literal(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(x) => Value::Float(*x),
        Literal::Double(x) => Value::Double(*x),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

/// `(a.b.c)`: a parenthesized chain of plain names.
fn is_name_chain_group(expr: &Expr) -> bool {
    fn chain(expr: &Expr) -> bool {
        match expr {
            Expr::Name { args: None, .. } => true,
            Expr::Member {
                target, args: None, ..
            } => chain(target),
            _ => false,
        }
    }
    matches!(expr, Expr::Group(inner) if chain(inner))
}

fn negate(value: Value) -> Result<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
        Value::Float(x) => Ok(Value::Float(-x)),
        Value::Double(x) => Ok(Value::Double(-x)),
        other => Err(ConsoleError::TypeMismatch {
            expected: "a number".to_string(),
            found: other.type_name(),
        }),
    }
}

/// The type whose members apply to `receiver`, and whether only static
/// members are reachable (the receiver is a type).
fn receiver_type(receiver: &Value, name: &str) -> Result<(TypeRef, bool)> {
    match receiver {
        Value::Null => Err(ConsoleError::NullReference(name.to_string())),
        Value::Type(ty) => Ok((Rc::clone(ty), true)),
        other => other
            .type_info()
            .map(|ty| (ty, false))
            .ok_or_else(|| ConsoleError::Eval(format!("cannot access '{name}': object is in use"))),
    }
}

/// An unqualified name: a member of the root, or a primitive type keyword.
fn read_name(root: &Value, name: &str) -> Result<Value> {
    match read_member(root, name) {
        Err(e) => primitive_by_name(name).map(Value::Type).ok_or(e),
        ok => ok,
    }
}

fn read_member(receiver: &Value, name: &str) -> Result<Value> {
    let (ty, static_only) = receiver_type(receiver, name)?;
    match ty.find_member(name) {
        Some(Member::Field(accessor) | Member::Property(accessor)) => {
            if static_only && !accessor.is_static {
                return Err(instance_required(&ty, name));
            }
            accessor.get(receiver)
        },
        Some(Member::Variant(ordinal)) => Ok(Value::Enum(EnumValue {
            ty: Rc::clone(&ty),
            ordinal,
        })),
        Some(Member::Nested(nested)) => Ok(Value::Type(Rc::clone(nested))),
        None => Err(unresolved(&ty, name)),
    }
}

fn write_member(receiver: &Value, name: &str, value: Value) -> Result<Value> {
    let (ty, static_only) = receiver_type(receiver, name)?;
    let read_only = || ConsoleError::ReadOnly {
        owner: ty.name().to_string(),
        name: name.to_string(),
    };
    match ty.find_member(name) {
        Some(Member::Field(accessor) | Member::Property(accessor)) => {
            if static_only && !accessor.is_static {
                return Err(instance_required(&ty, name));
            }
            if !accessor.is_writable() {
                return Err(read_only());
            }
            let kind = ty.resolve(&accessor.kind);
            let converted = value
                .convert_to(&kind)
                .ok_or_else(|| ConsoleError::TypeMismatch {
                    expected: kind.to_string(),
                    found: value.type_name(),
                })?;
            accessor.set(receiver, converted.clone())?;
            log::debug!("Assigned {}.{name} = {converted}", ty.name());
            Ok(converted)
        },
        Some(Member::Variant(_) | Member::Nested(_)) => Err(read_only()),
        None => Err(unresolved(&ty, name)),
    }
}

fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value> {
    let (ty, static_only) = receiver_type(receiver, name)?;
    let methods = ty.methods_named(name);
    if methods.is_empty() {
        return Err(unresolved(&ty, name));
    }
    let callable: Vec<_> = methods
        .into_iter()
        .filter(|(_, m)| m.is_static || !static_only)
        .collect();
    if callable.is_empty() {
        return Err(instance_required(&ty, name));
    }
    let (method, bound) =
        bind_overload(&callable, args).ok_or_else(|| no_overload(&ty, name, args))?;
    log::debug!("Calling {}.{name}{}", ty.name(), method.signature_in(&ty));
    method.invoke(receiver, &bound)
}

fn construct(ty: &TypeRef, args: &[Value]) -> Result<Value> {
    let candidates: Vec<_> = ty.constructors().iter().map(|c| (&**ty, c)).collect();
    let (ctor, bound) =
        bind_overload(&candidates, args).ok_or_else(|| no_overload(ty, "new", args))?;
    ctor.invoke(&Value::Type(Rc::clone(ty)), &bound)
}

/// Pick the first overload whose parameters accept `args` without
/// conversion, then the first one that accepts them with standard
/// conversions.
fn bind_overload<'m>(
    candidates: &[(&TypeInfo, &'m MethodInfo)],
    args: &[Value],
) -> Option<(&'m MethodInfo, Vec<Value>)> {
    [false, true].into_iter().find_map(|convert| {
        candidates.iter().find_map(|&(owner, method)| {
            bind(owner, &method.params, args, convert).map(|bound| (method, bound))
        })
    })
}

/// One value per parameter: the argument (converted to the parameter kind)
/// or the parameter default.
fn bind(owner: &TypeInfo, params: &[ParamInfo], args: &[Value], convert: bool) -> Option<Vec<Value>> {
    if args.len() > params.len() {
        return None;
    }
    params
        .iter()
        .enumerate()
        .map(|(i, param)| {
            let kind = owner.resolve(&param.kind);
            match args.get(i) {
                Some(arg) if arg.is_assignable_to(&kind) => Some(arg.clone()),
                Some(arg) if convert || kind.accepts(arg) => arg.convert_to(&kind),
                Some(_) => None,
                None => param.default.clone(),
            }
        })
        .collect()
}

/// `(T)value`: same type, then conversions declared along the value's type
/// hierarchy, then conversions into the target, then enum conversion.
/// Anything else passes through unconverted.
fn cast(value: Value, target: &TypeRef) -> Result<Value> {
    let kind = Kind::from_type(target);
    if value.is_assignable_to(&kind) {
        return Ok(value);
    }
    if let Some(own) = value.type_info() {
        if let Some(conversion) = own.conversion_to(&kind) {
            return conversion.convert(&value);
        }
    }
    if let Some(conversion) = target.conversion_from(&value) {
        return conversion.convert(&value);
    }
    if target.is_enum() {
        if let Some(converted) = value.convert_to(&kind) {
            return Ok(converted);
        }
    }
    log::debug!(
        "No conversion from {} to {}, value left unconverted",
        value.type_name(),
        target.name()
    );
    Ok(value)
}

fn unresolved(ty: &TypeInfo, name: &str) -> ConsoleError {
    ConsoleError::UnresolvedMember {
        name: name.to_string(),
        owner: ty.name().to_string(),
    }
}

fn instance_required(ty: &TypeInfo, name: &str) -> ConsoleError {
    ConsoleError::InstanceRequired {
        owner: ty.name().to_string(),
        name: name.to_string(),
    }
}

fn no_overload(ty: &TypeInfo, name: &str, args: &[Value]) -> ConsoleError {
    let args: Vec<String> = args.iter().map(Value::type_name).collect();
    ConsoleError::NoCompatibleOverload {
        owner: ty.name().to_string(),
        name: name.to_string(),
        args: args.join(", "),
    }
}
