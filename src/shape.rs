//! Static shape descriptions for conversion targets.
//!
//! A [`Shape`] describes *what* to load a dynamic value into (or what a
//! typed value was stored from): scalars, the open dynamic shape, generic
//! containers, records with named fields, tagged unions, enum types,
//! datetimes, generic type-parameter placeholders, textual forward
//! references, and custom opaque types carrying their own codec.
//!
//! Shapes are immutable descriptions and never own values. Structural
//! shapes compare structurally; shapes backed by a definition
//! ([`RecordDef`], [`EnumDef`], [`CustomDef`]) compare by definition
//! identity, so two separately declared records never alias even if their
//! field lists coincide.
//!
//! Forward references resolve against a [`TypeScope`]: a plain name table
//! populated at declaration time. There is no code evaluation anywhere in
//! resolution; [`RecordDef::declare`] registers the record under its own
//! name so self-references and mutually recursive references work.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::convert::{AsyncCodec, Codec};

/// Kind tag for scalar shapes.
///
/// Integer and float are distinct kinds and never cross-cast: a JSON `2`
/// satisfies only [`ScalarKind::Int`], a JSON `2.0` only
/// [`ScalarKind::Float`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Null => "null",
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Str => "str",
        };
        f.write_str(name)
    }
}

/// Description of a conversion target.
#[derive(Clone)]
pub enum Shape {
    /// A scalar of exactly the given kind.
    Scalar(ScalarKind),
    /// The open dynamic-value shape: accepts any JSON tree verbatim.
    Any,
    /// Ordered sequence with a single element shape.
    Seq(Box<Shape>),
    /// Set with a single element shape. Sets have no dynamic
    /// representation; they decode from a JSON array.
    Set(Box<Shape>),
    /// String-keyed mapping with a single value shape.
    Map(Box<Shape>),
    /// Fixed-arity tuple with one shape per member.
    Tuple(Vec<Shape>),
    /// A record instantiation: the definition plus the concrete shapes
    /// bound to its generic parameters (empty for non-generic records).
    Record(RecordShape),
    /// Ordered union of member shapes; first match wins on load.
    Union(Vec<Shape>),
    /// Generic type-parameter placeholder, bound only within the scope of
    /// an enclosing record instantiation.
    Param(String),
    /// Textual forward reference, resolved lazily against the enclosing
    /// record's declaring scope.
    Ref(String),
    /// Enum type with string or integer wire values.
    Enum(Arc<EnumDef>),
    /// UTC datetime.
    DateTime,
    /// Custom opaque type; the definition carries the codec capability.
    Custom(Arc<CustomDef>),
}

/// A record definition applied to concrete generic arguments.
#[derive(Clone)]
pub struct RecordShape {
    pub def: Arc<RecordDef>,
    pub args: Vec<Shape>,
}

impl Shape {
    pub fn null() -> Shape {
        Shape::Scalar(ScalarKind::Null)
    }

    pub fn boolean() -> Shape {
        Shape::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Shape {
        Shape::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Shape {
        Shape::Scalar(ScalarKind::Float)
    }

    pub fn string() -> Shape {
        Shape::Scalar(ScalarKind::Str)
    }

    pub fn seq(element: Shape) -> Shape {
        Shape::Seq(Box::new(element))
    }

    pub fn set(element: Shape) -> Shape {
        Shape::Set(Box::new(element))
    }

    pub fn map(value: Shape) -> Shape {
        Shape::Map(Box::new(value))
    }

    pub fn tuple(members: impl IntoIterator<Item = Shape>) -> Shape {
        Shape::Tuple(members.into_iter().collect())
    }

    pub fn union(members: impl IntoIterator<Item = Shape>) -> Shape {
        Shape::Union(members.into_iter().collect())
    }

    /// `shape | null`, the common optional pattern.
    pub fn optional(shape: Shape) -> Shape {
        Shape::Union(vec![shape, Shape::null()])
    }

    pub fn param(name: impl Into<String>) -> Shape {
        Shape::Param(name.into())
    }

    pub fn reference(name: impl Into<String>) -> Shape {
        Shape::Ref(name.into())
    }

    /// Non-generic record instantiation.
    pub fn record(def: Arc<RecordDef>) -> Shape {
        Shape::Record(RecordShape { def, args: Vec::new() })
    }

    /// Generic record instantiation with concrete argument shapes bound to
    /// the definition's parameters in declaration order.
    pub fn record_of(def: Arc<RecordDef>, args: impl IntoIterator<Item = Shape>) -> Shape {
        Shape::Record(RecordShape {
            def,
            args: args.into_iter().collect(),
        })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(kind) => write!(f, "{kind}"),
            Shape::Any => f.write_str("any"),
            Shape::Seq(e) => write!(f, "seq[{e}]"),
            Shape::Set(e) => write!(f, "set[{e}]"),
            Shape::Map(v) => write!(f, "map[str, {v}]"),
            Shape::Tuple(members) => {
                f.write_str("tuple[")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{m}")?;
                }
                f.write_str("]")
            }
            Shape::Record(inst) => {
                f.write_str(&inst.def.name)?;
                if !inst.args.is_empty() {
                    f.write_str("[")?;
                    for (i, a) in inst.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            Shape::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            Shape::Param(name) => write!(f, "{name}"),
            Shape::Ref(name) => write!(f, "{name}"),
            Shape::Enum(def) => f.write_str(&def.name),
            Shape::DateTime => f.write_str("datetime"),
            Shape::Custom(def) => f.write_str(&def.name),
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Scalar(a), Shape::Scalar(b)) => a == b,
            (Shape::Any, Shape::Any) => true,
            (Shape::Seq(a), Shape::Seq(b)) => a == b,
            (Shape::Set(a), Shape::Set(b)) => a == b,
            (Shape::Map(a), Shape::Map(b)) => a == b,
            (Shape::Tuple(a), Shape::Tuple(b)) => a == b,
            (Shape::Record(a), Shape::Record(b)) => {
                Arc::ptr_eq(&a.def, &b.def) && a.args == b.args
            }
            (Shape::Union(a), Shape::Union(b)) => a == b,
            (Shape::Param(a), Shape::Param(b)) => a == b,
            (Shape::Ref(a), Shape::Ref(b)) => a == b,
            (Shape::Enum(a), Shape::Enum(b)) => Arc::ptr_eq(a, b),
            (Shape::DateTime, Shape::DateTime) => true,
            (Shape::Custom(a), Shape::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Shape::Scalar(kind) => kind.hash(state),
            Shape::Any | Shape::DateTime => {}
            Shape::Seq(e) | Shape::Set(e) | Shape::Map(e) => e.hash(state),
            Shape::Tuple(members) | Shape::Union(members) => members.hash(state),
            Shape::Record(inst) => {
                (Arc::as_ptr(&inst.def) as usize).hash(state);
                inst.args.hash(state);
            }
            Shape::Param(name) | Shape::Ref(name) => name.hash(state),
            Shape::Enum(def) => (Arc::as_ptr(def) as usize).hash(state),
            Shape::Custom(def) => (Arc::as_ptr(def) as usize).hash(state),
        }
    }
}

/// One named, shaped field of a record.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub shape: Shape,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, shape: Shape) -> FieldDef {
        FieldDef {
            name: name.into(),
            shape,
        }
    }
}

/// A record type: named ordered fields, optional generic parameters, and
/// the scope it was declared in.
///
/// Declare records with [`RecordDef::declare`] so the definition is
/// registered in its scope and forward references to it resolve.
pub struct RecordDef {
    pub name: String,
    /// Generic parameter names, in declaration order. Empty for
    /// non-generic records.
    pub params: Vec<String>,
    /// Fields in declaration order; load and store both follow this order.
    pub fields: Vec<FieldDef>,
    scope: TypeScope,
}

impl RecordDef {
    /// Declares a record in `scope`, registering it under its own name so
    /// self-references and later references from the same scope resolve.
    pub fn declare(
        scope: &TypeScope,
        name: impl Into<String>,
        params: impl IntoIterator<Item = &'static str>,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Arc<RecordDef> {
        let def = Arc::new(RecordDef {
            name: name.into(),
            params: params.into_iter().map(str::to_owned).collect(),
            fields: fields.into_iter().collect(),
            scope: scope.clone(),
        });
        scope.bind(def.name.clone(), Shape::record(def.clone()));
        def
    }

    /// The scope this record was declared in; forward references inside
    /// its fields resolve against this.
    pub fn scope(&self) -> &TypeScope {
        &self.scope
    }

    /// Index of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl fmt::Debug for RecordDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Scope is omitted: it may refer back to this record.
        f.debug_struct("RecordDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Wire value of one enum variant.
#[derive(Clone, Debug, PartialEq)]
pub enum EnumWire {
    Int(i64),
    Str(String),
}

/// One named enum variant and its wire value.
#[derive(Clone, Debug)]
pub struct EnumVariant {
    pub name: String,
    pub wire: EnumWire,
}

/// An enum type: named variants carrying string or integer wire values.
#[derive(Debug)]
pub struct EnumDef {
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

impl EnumDef {
    pub fn new(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = (&'static str, EnumWire)>,
    ) -> Arc<EnumDef> {
        Arc::new(EnumDef {
            name: name.into(),
            variants: variants
                .into_iter()
                .map(|(name, wire)| EnumVariant {
                    name: name.to_owned(),
                    wire,
                })
                .collect(),
        })
    }

    /// Index of a variant by name.
    pub fn variant_index(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.name == name)
    }
}

/// Codec capability carried by a custom shape.
///
/// The hook converter recognizes custom shapes purely by this capability:
/// a sync codec decodes in place, an async codec decodes through a
/// deferred result.
#[derive(Clone)]
pub enum CodecKind {
    Sync(Arc<dyn Codec>),
    Async(Arc<dyn AsyncCodec>),
}

/// A custom opaque type: a name plus the codec that converts it.
pub struct CustomDef {
    pub name: String,
    codec: CodecKind,
}

impl CustomDef {
    /// Custom type with a synchronous codec.
    pub fn new(name: impl Into<String>, codec: Arc<dyn Codec>) -> Arc<CustomDef> {
        Arc::new(CustomDef {
            name: name.into(),
            codec: CodecKind::Sync(codec),
        })
    }

    /// Custom type whose decode side suspends; loads through this codec
    /// produce deferred results.
    pub fn with_async(name: impl Into<String>, codec: Arc<dyn AsyncCodec>) -> Arc<CustomDef> {
        Arc::new(CustomDef {
            name: name.into(),
            codec: CodecKind::Async(codec),
        })
    }

    pub fn codec(&self) -> &CodecKind {
        &self.codec
    }
}

impl fmt::Debug for CustomDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomDef")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Shared name→shape table used to resolve textual forward references.
///
/// A scope is populated when types are declared and consulted when a
/// [`Shape::Ref`] is loaded through a record declared in it. Lookup is
/// read-mostly; the table is safe to share across concurrent conversions.
#[derive(Clone, Default)]
pub struct TypeScope {
    names: Arc<RwLock<FxHashMap<String, Shape>>>,
}

impl TypeScope {
    pub fn new() -> TypeScope {
        TypeScope::default()
    }

    /// Registers `shape` under `name`, replacing any previous binding.
    pub fn bind(&self, name: impl Into<String>, shape: Shape) {
        self.names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), shape);
    }

    /// Looks up a name, returning a clone of the bound shape.
    pub fn lookup(&self, name: &str) -> Option<Shape> {
        self.names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl fmt::Debug for TypeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<&String> = names.keys().collect();
        keys.sort();
        f.debug_tuple("TypeScope").field(&keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_nested_shapes() {
        let shape = Shape::map(Shape::union([Shape::int(), Shape::string()]));
        assert_eq!(shape.to_string(), "map[str, int | str]");
        assert_eq!(
            Shape::tuple([Shape::int(), Shape::float()]).to_string(),
            "tuple[int, float]"
        );
    }

    #[test]
    fn record_identity_is_by_definition() {
        let scope = TypeScope::new();
        let a = RecordDef::declare(&scope, "P", [], [FieldDef::new("x", Shape::int())]);
        let b = RecordDef::declare(&scope, "P", [], [FieldDef::new("x", Shape::int())]);
        assert_eq!(Shape::record(a.clone()), Shape::record(a.clone()));
        assert_ne!(Shape::record(a), Shape::record(b));
    }

    #[test]
    fn declare_registers_own_name() {
        let scope = TypeScope::new();
        let def = RecordDef::declare(&scope, "Node", [], [FieldDef::new("next", Shape::optional(Shape::reference("Node")))]);
        let found = scope.lookup("Node").unwrap();
        assert_eq!(found, Shape::record(def));
    }
}
