//! Runtime introspection registry.
//!
//! Host types describe their members once with a [`TypeBuilder`]. The
//! resulting [`TypeInfo`] is shared as a [`TypeRef`] and returned by every
//! object of that type through [`Reflect::type_info`]. The evaluator only
//! ever talks to objects through this table.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tinker_types::error::{ConsoleError, Result};

use crate::ops::BinaryOp;
use crate::value::{Kind, Value};

/// Shared handle to a type description.
pub type TypeRef = Rc<TypeInfo>;

/// Shared handle to a host object.
pub type ObjectRef = Rc<RefCell<dyn Reflect>>;

/// Access to `Any` for downcasting trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A host object visible to the evaluator.
pub trait Reflect: AsAny {
    /// The type description shared by all objects of this type.
    fn type_info(&self) -> TypeRef;

    /// Text shown when the object is printed. Defaults to the type name.
    fn describe(&self) -> String {
        self.type_info().name().to_string()
    }
}

type Getter = dyn Fn(&Value) -> Result<Value>;
type Setter = dyn Fn(&Value, Value) -> Result<()>;
type Invoker = dyn Fn(&Value, &[Value]) -> Result<Value>;
type BinaryFn = dyn Fn(&Value, &Value) -> Result<Value>;
type ConvertFn = dyn Fn(&Value) -> Result<Value>;

/// A field or property: a getter and an optional setter.
pub struct Accessor {
    pub name: String,
    pub kind: Kind,
    pub is_static: bool,
    get: Box<Getter>,
    set: Option<Box<Setter>>,
}

impl Accessor {
    /// Read the member. `receiver` is ignored for static members.
    pub fn get(&self, receiver: &Value) -> Result<Value> {
        (self.get)(receiver)
    }

    pub fn is_writable(&self) -> bool {
        self.set.is_some()
    }

    /// Write the member. The value must already be of the declared kind.
    pub fn set(&self, receiver: &Value, value: Value) -> Result<()> {
        match &self.set {
            Some(set) => set(receiver, value),
            None => Err(ConsoleError::Eval(format!("{} has no setter", self.name))),
        }
    }
}

/// A declared method or constructor parameter.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub kind: Kind,
    /// Value used when the argument is omitted.
    pub default: Option<Value>,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A method or constructor.
pub struct MethodInfo {
    pub name: String,
    pub params: Vec<ParamInfo>,
    pub returns: Kind,
    pub is_static: bool,
    invoke: Box<Invoker>,
}

impl MethodInfo {
    /// Call with arguments already bound to `params` (one value per
    /// parameter, converted to its kind).
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value> {
        (self.invoke)(receiver, args)
    }

    /// `(x: float, y: float = 0): Vector2`
    pub fn signature(&self) -> String {
        self.render_signature(None)
    }

    /// Signature with [`Kind::Own`] spelled as the declaring type.
    pub fn signature_in(&self, owner: &TypeInfo) -> String {
        self.render_signature(Some(owner))
    }

    fn render_signature(&self, owner: Option<&TypeInfo>) -> String {
        let kind = |k: &Kind| owner.map_or_else(|| k.to_string(), |o| o.resolve(k).to_string());
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.default {
                Some(d) => format!("{}: {} = {d}", p.name, kind(&p.kind)),
                None => format!("{}: {}", p.name, kind(&p.kind)),
            })
            .collect();
        match self.returns {
            Kind::Void => format!("({})", params.join(", ")),
            ref ret => format!("({}): {}", params.join(", "), kind(ret)),
        }
    }
}

/// A binary operator overload. Applies when both operands are accepted by
/// the declared kinds.
pub struct OperatorInfo {
    pub op: BinaryOp,
    pub left: Kind,
    pub right: Kind,
    apply: Box<BinaryFn>,
}

impl OperatorInfo {
    pub fn apply(&self, left: &Value, right: &Value) -> Result<Value> {
        (self.apply)(left, right)
    }
}

/// A user-defined conversion between this type and another kind.
pub struct ConversionInfo {
    /// The other side: the target of an outgoing conversion or the source
    /// of an incoming one.
    pub kind: Kind,
    convert: Box<ConvertFn>,
}

impl ConversionInfo {
    pub fn convert(&self, value: &Value) -> Result<Value> {
        (self.convert)(value)
    }
}

/// A member found by name.
pub enum Member<'a> {
    Field(&'a Accessor),
    Property(&'a Accessor),
    /// Enum variant with its ordinal.
    Variant(i64),
    Nested(&'a TypeRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
    Type,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Type => "type",
            MemberKind::Method => "method",
        })
    }
}

/// One entry of a member listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
    /// `: int` for data members, the parameter list for methods, empty for
    /// nested types.
    pub signature: String,
    pub is_static: bool,
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            f.write_str("static ")?;
        }
        write!(f, "{} {}{}", self.kind, self.name, self.signature)
    }
}

/// Description of a host type.
pub struct TypeInfo {
    name: String,
    this: Weak<TypeInfo>,
    base: Option<TypeRef>,
    fields: Vec<Accessor>,
    properties: Vec<Accessor>,
    nested: Vec<TypeRef>,
    methods: Vec<MethodInfo>,
    constructors: Vec<MethodInfo>,
    operators: Vec<OperatorInfo>,
    conversions: Vec<ConversionInfo>,
    incoming: Vec<ConversionInfo>,
    variants: Option<Vec<(String, i64)>>,
}

impl TypeInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&TypeRef> {
        self.base.as_ref()
    }

    /// A shared handle to this type.
    pub fn handle(&self) -> Option<TypeRef> {
        self.this.upgrade()
    }

    pub fn is_enum(&self) -> bool {
        self.variants.is_some()
    }

    /// This type followed by its base types.
    pub fn hierarchy(&self) -> impl Iterator<Item = &TypeInfo> {
        std::iter::successors(Some(self), |t| t.base.as_deref())
    }

    /// Whether this type is `other` or derives from it.
    pub fn is_subtype_of(&self, other: &TypeInfo) -> bool {
        self.hierarchy().any(|t| t.name == other.name)
    }

    pub fn variant_name(&self, ordinal: i64) -> Option<&str> {
        self.variants
            .as_ref()?
            .iter()
            .find(|(_, o)| *o == ordinal)
            .map(|(n, _)| n.as_str())
    }

    pub fn variant_ordinal(&self, name: &str) -> Option<i64> {
        self.variants
            .as_ref()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| *o)
    }

    /// Replace [`Kind::Own`] with this type.
    pub fn resolve(&self, kind: &Kind) -> Kind {
        match (kind, self.handle()) {
            (Kind::Own, Some(this)) => Kind::Type(this),
            _ => kind.clone(),
        }
    }

    /// Look a name up: fields (enum variants included), then properties,
    /// then nested types. Each stage walks the hierarchy, most derived
    /// first.
    pub fn find_member(&self, name: &str) -> Option<Member<'_>> {
        if let Some(ordinal) = self.variant_ordinal(name) {
            return Some(Member::Variant(ordinal));
        }
        let field = self
            .hierarchy()
            .find_map(|t| t.fields.iter().find(|a| a.name == name));
        if let Some(field) = field {
            return Some(Member::Field(field));
        }
        let property = self
            .hierarchy()
            .find_map(|t| t.properties.iter().find(|a| a.name == name));
        if let Some(property) = property {
            return Some(Member::Property(property));
        }
        self.hierarchy()
            .find_map(|t| t.nested.iter().find(|n| n.name == name))
            .map(Member::Nested)
    }

    /// All methods called `name`, most derived first, with the type that
    /// declares each.
    pub fn methods_named(&self, name: &str) -> Vec<(&TypeInfo, &MethodInfo)> {
        self.hierarchy()
            .flat_map(|t| {
                t.methods
                    .iter()
                    .filter(move |m| m.name == name)
                    .map(move |m| (t, m))
            })
            .collect()
    }

    pub fn constructors(&self) -> &[MethodInfo] {
        &self.constructors
    }

    /// Overloads of `op` declared along the hierarchy.
    pub fn operators(&self, op: BinaryOp) -> Vec<(&TypeInfo, &OperatorInfo)> {
        self.hierarchy()
            .flat_map(|t| {
                t.operators
                    .iter()
                    .filter(move |o| o.op == op)
                    .map(move |o| (t, o))
            })
            .collect()
    }

    /// First outgoing conversion to `kind` along the hierarchy.
    pub fn conversion_to(&self, kind: &Kind) -> Option<&ConversionInfo> {
        self.hierarchy()
            .find_map(|t| t.conversions.iter().find(|c| t.resolve(&c.kind) == *kind))
    }

    /// First incoming conversion accepting `value`.
    pub fn conversion_from(&self, value: &Value) -> Option<&ConversionInfo> {
        self.incoming
            .iter()
            .find(|c| self.resolve(&c.kind).accepts(value))
    }

    /// Every member reachable on this type: variants, fields, properties,
    /// nested types and methods. Members hidden by a more derived
    /// declaration of the same name and shape are listed once.
    pub fn list_members(&self) -> Vec<MemberDescriptor> {
        let mut out: Vec<MemberDescriptor> = Vec::new();
        let mut push = |d: MemberDescriptor| {
            if !out.contains(&d) {
                out.push(d);
            }
        };
        if let Some(variants) = &self.variants {
            for (name, _) in variants {
                push(MemberDescriptor {
                    name: name.clone(),
                    kind: MemberKind::Field,
                    signature: format!(": {}", self.name),
                    is_static: true,
                });
            }
        }
        for t in self.hierarchy() {
            for (kind, accessors) in [
                (MemberKind::Field, &t.fields),
                (MemberKind::Property, &t.properties),
            ] {
                for a in accessors {
                    push(MemberDescriptor {
                        name: a.name.clone(),
                        kind,
                        signature: format!(": {}", t.resolve(&a.kind)),
                        is_static: a.is_static,
                    });
                }
            }
        }
        for t in self.hierarchy() {
            for n in &t.nested {
                push(MemberDescriptor {
                    name: n.name.clone(),
                    kind: MemberKind::Type,
                    signature: String::new(),
                    is_static: true,
                });
            }
        }
        for t in self.hierarchy() {
            for m in &t.methods {
                push(MemberDescriptor {
                    name: m.name.clone(),
                    kind: MemberKind::Method,
                    signature: m.signature_in(t),
                    is_static: m.is_static,
                });
            }
        }
        out
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .finish_non_exhaustive()
    }
}

/// Borrow `value` as a `T` for the duration of `f`.
pub fn with_ref<T: Reflect, R>(value: &Value, f: impl FnOnce(&T) -> R) -> Result<R> {
    let obj = value.as_object()?;
    let guard = obj.try_borrow().map_err(|_| in_use::<T>())?;
    let this: &dyn Reflect = &*guard;
    match this.as_any().downcast_ref::<T>() {
        Some(this) => Ok(f(this)),
        None => Err(wrong_type::<T>(this.type_info().name())),
    }
}

/// Mutably borrow `value` as a `T` for the duration of `f`.
pub fn with_mut<T: Reflect, R>(value: &Value, f: impl FnOnce(&mut T) -> R) -> Result<R> {
    let obj = value.as_object()?;
    let mut guard = obj.try_borrow_mut().map_err(|_| in_use::<T>())?;
    let this: &mut dyn Reflect = &mut *guard;
    let found = this.type_info();
    match this.as_any_mut().downcast_mut::<T>() {
        Some(this) => Ok(f(this)),
        None => Err(wrong_type::<T>(found.name())),
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

fn in_use<T>() -> ConsoleError {
    ConsoleError::Eval(format!("{} is already in use", short_type_name::<T>()))
}

fn wrong_type<T>(found: &str) -> ConsoleError {
    ConsoleError::TypeMismatch {
        expected: short_type_name::<T>().to_string(),
        found: found.to_string(),
    }
}

/// Builds a [`TypeInfo`].
///
/// Typed helpers (`field`, `property`, `method`) downcast the receiver to
/// the host struct. The `raw_*` forms receive the receiver as a [`Value`],
/// which is what primitive types and computed members need.
pub struct TypeBuilder {
    info: TypeInfo,
}

impl TypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: TypeInfo {
                name: name.into(),
                this: Weak::new(),
                base: None,
                fields: Vec::new(),
                properties: Vec::new(),
                nested: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                operators: Vec::new(),
                conversions: Vec::new(),
                incoming: Vec::new(),
                variants: None,
            },
        }
    }

    /// An enum type. Variants are static fields; `==`/`!=` compare
    /// ordinals and the type converts to `int`.
    pub fn enumeration(name: impl Into<String>, variants: &[(&str, i64)]) -> Self {
        let mut builder = Self::new(name);
        builder.info.variants = Some(
            variants
                .iter()
                .map(|(n, o)| ((*n).to_string(), *o))
                .collect(),
        );
        builder
            .operator(BinaryOp::Eq, Kind::Own, Kind::Own, |l, r| {
                Ok(Value::Bool(l.as_enum()?.ordinal == r.as_enum()?.ordinal))
            })
            .operator(BinaryOp::Ne, Kind::Own, Kind::Own, |l, r| {
                Ok(Value::Bool(l.as_enum()?.ordinal != r.as_enum()?.ordinal))
            })
            .conversion(Kind::Int, |v| Ok(Value::Int(v.as_enum()?.ordinal)))
    }

    pub fn base(mut self, base: &TypeRef) -> Self {
        self.info.base = Some(Rc::clone(base));
        self
    }

    pub fn field<T: Reflect>(
        mut self,
        name: impl Into<String>,
        kind: Kind,
        get: impl Fn(&T) -> Value + 'static,
        set: impl Fn(&mut T, Value) + 'static,
    ) -> Self {
        self.info.fields.push(Accessor {
            name: name.into(),
            kind,
            is_static: false,
            get: Box::new(move |recv: &Value| with_ref(recv, &get)),
            set: Some(Box::new(move |recv: &Value, v: Value| {
                with_mut(recv, |t| set(t, v))
            })),
        });
        self
    }

    pub fn readonly_field<T: Reflect>(
        mut self,
        name: impl Into<String>,
        kind: Kind,
        get: impl Fn(&T) -> Value + 'static,
    ) -> Self {
        self.info.fields.push(Accessor {
            name: name.into(),
            kind,
            is_static: false,
            get: Box::new(move |recv: &Value| with_ref(recv, &get)),
            set: None,
        });
        self
    }

    /// A read-only property.
    pub fn property<T: Reflect>(
        mut self,
        name: impl Into<String>,
        kind: Kind,
        get: impl Fn(&T) -> Value + 'static,
    ) -> Self {
        self.info.properties.push(Accessor {
            name: name.into(),
            kind,
            is_static: false,
            get: Box::new(move |recv: &Value| with_ref(recv, &get)),
            set: None,
        });
        self
    }

    /// A read-write property. The setter may reject the value.
    pub fn property_mut<T: Reflect>(
        mut self,
        name: impl Into<String>,
        kind: Kind,
        get: impl Fn(&T) -> Value + 'static,
        set: impl Fn(&mut T, Value) -> Result<()> + 'static,
    ) -> Self {
        self.info.properties.push(Accessor {
            name: name.into(),
            kind,
            is_static: false,
            get: Box::new(move |recv: &Value| with_ref(recv, &get)),
            set: Some(Box::new(move |recv: &Value, v: Value| {
                with_mut(recv, |t| set(t, v))?
            })),
        });
        self
    }

    /// A static field. Pass `None` for a constant.
    pub fn static_field(
        mut self,
        name: impl Into<String>,
        kind: Kind,
        get: impl Fn() -> Value + 'static,
        set: Option<Box<dyn Fn(Value)>>,
    ) -> Self {
        self.info.fields.push(Accessor {
            name: name.into(),
            kind,
            is_static: true,
            get: Box::new(move |_: &Value| Ok(get())),
            set: set.map(|set| -> Box<Setter> {
                Box::new(move |_: &Value, v: Value| {
                    set(v);
                    Ok(())
                })
            }),
        });
        self
    }

    /// A read-only static property.
    pub fn static_property(
        mut self,
        name: impl Into<String>,
        kind: Kind,
        get: impl Fn() -> Value + 'static,
    ) -> Self {
        self.info.properties.push(Accessor {
            name: name.into(),
            kind,
            is_static: true,
            get: Box::new(move |_: &Value| Ok(get())),
            set: None,
        });
        self
    }

    /// A read-only instance property computed from the receiver value.
    pub fn raw_property(
        mut self,
        name: impl Into<String>,
        kind: Kind,
        get: impl Fn(&Value) -> Result<Value> + 'static,
    ) -> Self {
        self.info.properties.push(Accessor {
            name: name.into(),
            kind,
            is_static: false,
            get: Box::new(get),
            set: None,
        });
        self
    }

    pub fn method<T: Reflect>(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamInfo>,
        returns: Kind,
        f: impl Fn(&mut T, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.info.methods.push(MethodInfo {
            name: name.into(),
            params,
            returns,
            is_static: false,
            invoke: Box::new(move |recv: &Value, args: &[Value]| {
                with_mut(recv, |t| f(t, args))?
            }),
        });
        self
    }

    /// An instance method receiving the receiver as a value.
    pub fn raw_method(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamInfo>,
        returns: Kind,
        f: impl Fn(&Value, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.info.methods.push(MethodInfo {
            name: name.into(),
            params,
            returns,
            is_static: false,
            invoke: Box::new(f),
        });
        self
    }

    pub fn static_method(
        mut self,
        name: impl Into<String>,
        params: Vec<ParamInfo>,
        returns: Kind,
        f: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.info.methods.push(MethodInfo {
            name: name.into(),
            params,
            returns,
            is_static: true,
            invoke: Box::new(move |_: &Value, args: &[Value]| f(args)),
        });
        self
    }

    /// A constructor, called by `new Type(..)`.
    pub fn constructor(
        mut self,
        params: Vec<ParamInfo>,
        f: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Self {
        let name = self.info.name.clone();
        self.info.constructors.push(MethodInfo {
            name,
            params,
            returns: Kind::Own,
            is_static: true,
            invoke: Box::new(move |_: &Value, args: &[Value]| f(args)),
        });
        self
    }

    pub fn nested(mut self, ty: &TypeRef) -> Self {
        self.info.nested.push(Rc::clone(ty));
        self
    }

    pub fn operator(
        mut self,
        op: BinaryOp,
        left: Kind,
        right: Kind,
        f: impl Fn(&Value, &Value) -> Result<Value> + 'static,
    ) -> Self {
        self.info.operators.push(OperatorInfo {
            op,
            left,
            right,
            apply: Box::new(f),
        });
        self
    }

    /// A conversion from this type to `to`.
    pub fn conversion(
        mut self,
        to: Kind,
        f: impl Fn(&Value) -> Result<Value> + 'static,
    ) -> Self {
        self.info.conversions.push(ConversionInfo {
            kind: to,
            convert: Box::new(f),
        });
        self
    }

    /// A conversion from `from` into this type.
    pub fn conversion_from(
        mut self,
        from: Kind,
        f: impl Fn(&Value) -> Result<Value> + 'static,
    ) -> Self {
        self.info.incoming.push(ConversionInfo {
            kind: from,
            convert: Box::new(f),
        });
        self
    }

    pub fn build(self) -> TypeRef {
        let info = self.info;
        log::debug!("Registered type {}", info.name);
        Rc::new_cyclic(|this| TypeInfo {
            this: Weak::clone(this),
            ..info
        })
    }
}
