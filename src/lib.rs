//! # Recast: Shape-directed JSON Conversion Engine
//!
//! Recast converts between dynamic, schema-less JSON trees
//! ([`serde_json::Value`]) and statically described domain values, without
//! hand-written per-type glue. An application declares a target [`Shape`]
//! (scalars, sequences, sets, maps, tuples, records, unions, enums,
//! datetimes, generic parameters, forward references, custom codec-backed
//! types) and the engine populates a [`TypedValue`] from a decoded
//! document, or flattens one back into a document.
//!
//! ## Core Concepts
//!
//! - **Shapes**: immutable descriptions of conversion targets
//! - **Converters**: predicate + transform pairs for one shape family
//! - **Registries**: ordered, first-match converter collections
//! - **Contexts**: per-call recursion state (generic bindings, enclosing
//!   record, sync-mode flag)
//! - **Deferred results**: placeholders for suspending converters,
//!   resolved recursively by the async entry point
//!
//! ## Quick Start
//!
//! ### Loading collections and unions
//!
//! ```
//! use recast::{from_json, Shape, TypedValue};
//! use serde_json::json;
//!
//! let loaded = from_json(&Shape::map(Shape::int()), &json!({"a": 1, "b": 2})).unwrap();
//! assert_eq!(loaded.kind(), recast::TypedKind::Map);
//!
//! // Unions try members in declared order; scalars fast-accept.
//! let shape = Shape::union([Shape::int(), Shape::string()]);
//! assert_eq!(from_json(&shape, &json!(5)).unwrap(), TypedValue::Int(5));
//! ```
//!
//! ### Declaring and round-tripping a record
//!
//! ```
//! use recast::{from_json, to_json, FieldDef, RecordDef, Shape, TypeScope, TypedValue};
//! use serde_json::json;
//!
//! let scope = TypeScope::new();
//! let point = RecordDef::declare(
//!     &scope,
//!     "Point",
//!     [],
//!     [
//!         FieldDef::new("x", Shape::int()),
//!         FieldDef::new("y", Shape::int()),
//!     ],
//! );
//!
//! let loaded = from_json(&Shape::record(point.clone()), &json!({"x": 1, "y": 2})).unwrap();
//! assert_eq!(loaded.field("x"), Some(&TypedValue::Int(1)));
//! assert_eq!(to_json(&loaded).unwrap(), json!({"x": 1, "y": 2}));
//! ```
//!
//! ### Layering custom converters
//!
//! Registries are immutable; `with_*` produces a new registry with the
//! addition appended at lower priority, leaving the original untouched:
//!
//! ```
//! use std::sync::Arc;
//! use recast::{registry, from_json_with, Shape};
//! use serde_json::json;
//!
//! let custom = registry(); // extend with .with_loader(...) / .with_converter(...)
//! let loaded = from_json_with(Arc::new(custom), &Shape::seq(Shape::int()), &json!([1, 2, 3]));
//! assert!(loaded.is_ok());
//! ```
//!
//! ## Sync vs Async
//!
//! [`from_json`] is strictly synchronous: if any converter in the tree
//! suspends (an async codec, or a gated registry whose gate is closed),
//! it fails with an async-in-sync-context error instead of returning an
//! unresolved placeholder. [`from_json_async`] permits suspension and
//! recursively resolves every deferred result before returning.
//!
//! ## Module Guide
//!
//! - [`shape`] - Shape descriptions, record/enum/custom definitions, scopes
//! - [`value`] - Typed domain values and runtime tags
//! - [`convert`] - Converter traits and conversion contexts
//! - [`registry`] - Ordered registries and the wait-gated variant
//! - [`converters`] - The builtin converter catalogue
//! - [`deferred`] - Deferred placeholders and the recursive resolver
//! - [`error`] - Conversion error types
//! - [`api`] - Top-level entry points and default registries

pub mod api;
pub mod convert;
pub mod converters;
pub mod deferred;
pub mod error;
pub mod registry;
pub mod shape;
pub mod value;

pub use api::{
    from_json, from_json_async, from_json_async_lenient, from_json_async_with, from_json_lenient,
    from_json_with, registry, registry_lenient, to_json, to_json_with,
};
pub use convert::{
    AsyncCodec, AsyncLoad, Codec, Converter, DeferredLoad, Load, LoadContext, Store, StoreContext,
};
pub use deferred::{Deferred, resolve};
pub use error::ConvertError;
pub use registry::{ConverterRegistry, GatedRegistry, LoaderRegistry, ReleaseGate, StoreRegistry};
pub use shape::{
    CodecKind, CustomDef, EnumDef, EnumVariant, EnumWire, FieldDef, RecordDef, RecordShape,
    ScalarKind, Shape, TypeScope,
};
pub use value::{TypedKind, TypedValue, json_kind};
