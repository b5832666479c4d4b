//! Declarative key descriptors shared by the document runtime: declared
//! primitive types, key options, and the validation and index requests
//! derived from those options.

pub mod error;
pub mod index;
pub mod options;
pub mod rule;
pub mod types;

/// Maximum length for key and association identifiers.
pub const MAX_KEY_NAME_LEN: usize = 64;

/// Maximum length for model identifiers.
pub const MAX_MODEL_NAME_LEN: usize = 64;

pub use error::SchemaError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        error::SchemaError,
        index::{IndexDirection, IndexRequest},
        options::{KeyOptions, LengthOption},
        rule::{LengthBound, ValidationRequest, ValidationRule},
        types::{Cardinality, Primitive},
    };
    pub use serde::{Deserialize, Serialize};
}
