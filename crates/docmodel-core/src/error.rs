use crate::{coerce::CoercionError, config::ConfigError, model::Model};
use docmodel_schema::{SchemaError, types::Cardinality};
use thiserror::Error as ThisError;

///
/// Error
///
/// Raised synchronously at the offending call (declaration, construction,
/// assignment). Nothing is retried or deferred.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("unknown attribute '{attribute}' for model {model}")]
    UnknownAttribute { model: String, attribute: String },

    #[error("unknown association '{association}' for model {model}")]
    UnknownAssociation { model: String, association: String },

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("expected a {expected} document, found {found}")]
    ModelMismatch { expected: String, found: String },

    #[error("association '{association}' on {model} is not a {expected} association")]
    CardinalityMismatch {
        model: String,
        association: String,
        expected: Cardinality,
    },

    #[error("'{name}' on {model} is declared as both a key and an association")]
    NameCollision { model: String, name: String },

    #[error("association '{association}' on {model} closes an embedded cycle: {path}")]
    AssociationCycle {
        model: String,
        association: String,
        path: String,
    },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub(crate) fn unknown_attribute(model: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            model: model.into(),
            attribute: attribute.into(),
        }
    }

    pub(crate) fn name_collision(model: &Model, name: impl Into<String>) -> Self {
        Self::NameCollision {
            model: model.name().to_string(),
            name: name.into(),
        }
    }

    pub(crate) fn unknown_association(
        model: impl Into<String>,
        association: impl Into<String>,
    ) -> Self {
        Self::UnknownAssociation {
            model: model.into(),
            association: association.into(),
        }
    }

    /// Whether this error came from the coercer rather than the schema.
    #[must_use]
    pub const fn is_coercion_failure(&self) -> bool {
        matches!(self, Self::Coercion(_))
    }
}
