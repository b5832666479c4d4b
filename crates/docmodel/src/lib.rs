//! ## Crate layout
//! - `core`: values, coercion, models, documents, observability and TOML
//!   schema loading.
//! - `schema`: key options and the validation and index requests derived
//!   from them.
//!
//! The `prelude` module carries the vocabulary needed to declare models and
//! build documents.

pub use docmodel_core as core;
pub use docmodel_schema as schema;

pub use crate::core::{
    Error,
    config::{Catalog, SchemaConfig, load_schema},
    obs,
};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use serde::{Deserialize, Serialize};
}
