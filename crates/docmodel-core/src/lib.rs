//! Core runtime for docmodel: values, coercion, models with inheritance-aware
//! key registries, documents with raw and typed attribute slots, and the
//! embedded-association bridge.

// public exports are one module level down
pub mod coerce;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod obs;
pub mod value;

pub use error::Error;

///
/// Prelude
///
/// Prelude contains domain vocabulary. The schema prelude brings
/// `SchemaError` along; runtime errors, sinks and config loaders stay out.
///

pub mod prelude {
    pub use crate::{
        coerce::{Coercer, NativeCoercer},
        document::{Attribute, AssociationValue, Document},
        model::{Association, Key, KeyType, Model, ModelKind, UnknownAttributes},
        value::{AttributeMap, Value},
    };
    pub use docmodel_schema::prelude::*;
}
