use crate::model::Model;
use docmodel_schema::{
    SchemaError, error::validate_key_name, index::IndexRequest, options::KeyOptions,
    rule::ValidationRequest, types::Primitive,
};
use std::{fmt, slice::Iter};

///
/// KeyType
///
/// Native keys hold a primitive; embedded keys hold a nested document of
/// another model.
///

#[derive(Clone, Debug, PartialEq)]
pub enum KeyType {
    Native(Primitive),
    Embedded(Model),
}

impl KeyType {
    #[must_use]
    pub const fn primitive(&self) -> Option<Primitive> {
        match self {
            Self::Native(primitive) => Some(*primitive),
            Self::Embedded(_) => None,
        }
    }

    #[must_use]
    pub const fn embedded_model(&self) -> Option<&Model> {
        match self {
            Self::Native(_) => None,
            Self::Embedded(model) => Some(model),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(primitive) => write!(f, "{primitive}"),
            Self::Embedded(model) => write!(f, "{}", model.name()),
        }
    }
}

impl From<Primitive> for KeyType {
    fn from(primitive: Primitive) -> Self {
        Self::Native(primitive)
    }
}

impl From<Model> for KeyType {
    fn from(model: Model) -> Self {
        Self::Embedded(model)
    }
}

impl From<&Model> for KeyType {
    fn from(model: &Model) -> Self {
        Self::Embedded(model.clone())
    }
}

///
/// Key
///
/// Immutable key definition. Validation requests are derived once, when the
/// key is built, so an invalid option set never reaches a registry.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    name: String,
    ty: KeyType,
    options: KeyOptions,
    validations: Vec<ValidationRequest>,
}

impl Key {
    pub fn new(
        name: impl Into<String>,
        ty: impl Into<KeyType>,
        options: KeyOptions,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let ty = ty.into();
        validate_key_name(&name)?;

        let only_integers = ty.primitive().is_some_and(Primitive::is_int);
        let validations = options.validation_requests(&name, only_integers)?;

        Ok(Self {
            name,
            ty,
            options,
            validations,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn ty(&self) -> &KeyType {
        &self.ty
    }

    #[must_use]
    pub const fn options(&self) -> &KeyOptions {
        &self.options
    }

    /// Native keys hold primitives; all others embed a document.
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self.ty, KeyType::Native(_))
    }

    #[must_use]
    pub fn validation_requests(&self) -> &[ValidationRequest] {
        &self.validations
    }

    #[must_use]
    pub fn index_request(&self) -> Option<IndexRequest> {
        self.options.index_request(&self.name)
    }
}

///
/// KeyRegistry
///
/// Ordered name → key table. Re-inserting a name replaces the definition in
/// place, keeping the original registration position.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyRegistry {
    keys: Vec<Key>,
}

impl KeyRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self { keys: Vec::new() }
    }

    // get
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert(&mut self, key: Key) {
        match self.keys.iter_mut().find(|k| k.name == key.name) {
            Some(slot) => *slot = key,
            None => self.keys.push(key),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(Key::name)
    }

    pub fn iter(&self) -> Iter<'_, Key> {
        self.keys.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True if every key in `other` is present here under the same definition.
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.iter().all(|key| self.get(&key.name) == Some(key))
    }
}

impl<'a> IntoIterator for &'a KeyRegistry {
    type Item = &'a Key;
    type IntoIter = Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
