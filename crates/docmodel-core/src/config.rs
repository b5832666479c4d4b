//! Declarative schema loading from TOML.
//!
//! Models are built in file order, so a parent, an embedded key type or an
//! association target must be declared before it is referenced. The one
//! exception is an association pointing back at the model being declared.

use crate::{
    error::Error,
    model::{KeyType, Model, ModelKind, UnknownAttributes},
};
use docmodel_schema::{
    error::validate_model_name,
    options::{KeyOptions, LengthOption},
    types::{Cardinality, Primitive},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing::debug;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("schema parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("model '{0}' is declared more than once")]
    DuplicateModel(String),

    #[error("key '{model}.{key}' has unknown type '{ty}'")]
    UnknownType {
        model: String,
        key: String,
        ty: String,
    },
}

///
/// SchemaConfig
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    #[serde(default)]
    pub model: Vec<ModelConfig>,
}

///
/// ModelConfig
///
/// `kind` is ignored when `parent` is set; submodels always take their
/// parent's kind. `unknown_attributes` falls back to the parent's policy.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub name: String,

    #[serde(default)]
    pub kind: ModelKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_attributes: Option<UnknownAttributes>,

    #[serde(default)]
    pub key: Vec<KeyConfig>,

    #[serde(default)]
    pub association: Vec<AssociationConfig>,
}

///
/// KeyConfig
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    pub name: String,

    /// A primitive name, or the name of an earlier model to embed.
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub numeric: bool,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub length: Option<LengthOption>,

    #[serde(default)]
    pub index: bool,
}

impl KeyConfig {
    #[must_use]
    pub fn options(&self) -> KeyOptions {
        KeyOptions {
            required: self.required,
            unique: self.unique,
            numeric: self.numeric,
            format: self.format.clone(),
            length: self.length.clone(),
            index: self.index,
        }
    }
}

///
/// AssociationConfig
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationConfig {
    pub name: String,
    pub cardinality: Cardinality,
    pub target: String,
}

impl SchemaConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Build every declared model, in order.
    pub fn build(&self) -> Result<Catalog, Error> {
        let mut catalog = Catalog::default();

        for decl in &self.model {
            validate_model_name(&decl.name)?;
            if catalog.get(&decl.name).is_some() {
                return Err(ConfigError::DuplicateModel(decl.name.clone()).into());
            }

            let model = match &decl.parent {
                Some(parent) => Model::inherit(catalog.require(parent)?, decl.name.as_str()),
                None => match decl.kind {
                    ModelKind::Document => Model::document(decl.name.as_str()),
                    ModelKind::Embedded => Model::embedded(decl.name.as_str()),
                },
            };
            let model = match decl.unknown_attributes {
                Some(policy) => model.with_unknown_attributes(policy),
                None => model,
            };

            for key in &decl.key {
                let ty = catalog.resolve_type(&decl.name, key)?;
                model.key(key.name.as_str(), ty, key.options())?;
            }

            for assoc in &decl.association {
                let target = if assoc.target == decl.name {
                    model.clone()
                } else {
                    catalog.require(&assoc.target)?.clone()
                };
                match assoc.cardinality {
                    Cardinality::One => model.one(assoc.name.as_str(), &target)?,
                    Cardinality::Many => model.many(assoc.name.as_str(), &target)?,
                };
            }

            debug!(
                model = %model,
                kind = %model.kind(),
                keys = decl.key.len(),
                associations = decl.association.len(),
                "loaded model"
            );
            catalog.models.push(model);
        }

        Ok(catalog)
    }
}

/// Parse and build in one step.
pub fn load_schema(source: &str) -> Result<Catalog, Error> {
    SchemaConfig::from_toml_str(source)?.build()
}

///
/// Catalog
///
/// Built models in declaration order, looked up by name.
///

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    models: Vec<Model>,
}

impl Catalog {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.name() == name)
    }

    pub fn require(&self, name: &str) -> Result<&Model, Error> {
        self.get(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    // primitives win over model names
    fn resolve_type(&self, model: &str, key: &KeyConfig) -> Result<KeyType, Error> {
        if let Ok(primitive) = key.ty.parse::<Primitive>() {
            return Ok(KeyType::Native(primitive));
        }

        self.get(&key.ty)
            .map(|target| KeyType::Embedded(target.clone()))
            .ok_or_else(|| {
                ConfigError::UnknownType {
                    model: model.to_string(),
                    key: key.name.clone(),
                    ty: key.ty.clone(),
                }
                .into()
            })
    }
}

///
/// TESTS
///
