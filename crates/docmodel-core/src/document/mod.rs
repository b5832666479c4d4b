//! Document instances: the per-instance attribute store, equality and
//! inspection. The association half lives in `association`.

mod association;


pub use association::AssociationValue;

use crate::{
    coerce::{Coercer, CoercionError},
    error::Error,
    model::{Key, KeyType, Model, UnknownAttributes},
    obs::{self, SchemaEvent},
    value::{AttributeMap, Value, attributes_from_json},
};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::{collections::BTreeMap, fmt};
use time::{Date, OffsetDateTime};
use tracing::warn;

///
/// Attribute
///
/// What a key slot holds: a plain value, or a nested document for
/// embedded keys.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Value(Value),
    Document(Box<Document>),
}

impl Attribute {
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Document(_) => None,
        }
    }

    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Value(_) => None,
            Self::Document(doc) => Some(doc),
        }
    }

    /// Export form: documents become their attribute mapping.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Document(doc) => Value::Map(doc.attributes()),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Document(doc) => write!(f, "{doc}"),
        }
    }
}

macro_rules! impl_attribute_from {
    ( $( $ty:ty ),* $(,)? ) => {
        $(
            impl From<$ty> for Attribute {
                fn from(v: $ty) -> Self {
                    Self::Value(v.into())
                }
            }
        )*
    };
}

impl_attribute_from!(
    bool,
    i32,
    i64,
    f64,
    &str,
    String,
    Date,
    OffsetDateTime,
    Vec<Value>,
    AttributeMap,
    Value,
);

impl From<Document> for Attribute {
    fn from(doc: Document) -> Self {
        Self::Document(Box::new(doc))
    }
}

///
/// Slot
///
/// `raw` is always the last written value; `typed` is what coercion made of
/// it, or `None` when coercion failed or produced nothing.
///

#[derive(Clone, Debug, PartialEq)]
struct Slot {
    raw: Attribute,
    typed: Option<Attribute>,
}

///
/// Document
///

#[derive(Clone, Debug)]
pub struct Document {
    model: Model,
    slots: BTreeMap<String, Slot>,
    associations: BTreeMap<String, AssociationValue>,
}

impl Document {
    #[must_use]
    pub fn empty(model: &Model) -> Self {
        Self {
            model: model.clone(),
            slots: BTreeMap::new(),
            associations: BTreeMap::new(),
        }
    }

    /// Build a document: association entries are routed through the bridge
    /// first, everything else through `assign`.
    pub fn new(model: &Model, mut attrs: AttributeMap) -> Result<Self, Error> {
        let mut doc = Self::empty(model);
        doc.initialize_associations(&mut attrs)?;
        doc.assign(attrs)?;

        Ok(doc)
    }

    /// Build a document from a JSON object (or `null` for an empty one).
    pub fn from_json(model: &Model, json: JsonValue) -> Result<Self, Error> {
        let found = Value::from(json.clone());
        let attrs = attributes_from_json(json)
            .ok_or_else(|| CoercionError::unsupported(model.name(), &found))?;

        Self::new(model, attrs)
    }

    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    fn key_or_unknown(&self, name: &str) -> Result<Key, Error> {
        self.model
            .key_definition(name)
            .ok_or_else(|| Error::unknown_attribute(self.model.name(), name))
    }

    //
    // accessors
    //

    /// Typed value for `name`, passed through the coercer on the way out.
    pub fn read(&self, name: &str) -> Result<Option<Attribute>, Error> {
        let key = self.key_or_unknown(name)?;

        Ok(self.typed_attribute(&key, self.model.coercer().as_ref()))
    }

    fn typed_attribute(&self, key: &Key, coercer: &dyn Coercer) -> Option<Attribute> {
        let typed = self.slots.get(key.name())?.typed.as_ref()?;

        Some(match (key.ty(), typed) {
            (KeyType::Native(primitive), Attribute::Value(stored)) => {
                Attribute::Value(coercer.get(*primitive, stored))
            }
            (_, other) => other.clone(),
        })
    }

    /// Shorthand for `read` on native keys.
    pub fn read_value(&self, name: &str) -> Result<Option<Value>, Error> {
        Ok(self.read(name)?.map(|attribute| attribute.to_value()))
    }

    /// The value exactly as last written, before any coercion.
    pub fn read_before_type_cast(&self, name: &str) -> Result<Option<&Attribute>, Error> {
        self.key_or_unknown(name)?;

        Ok(self.slots.get(name).map(|slot| &slot.raw))
    }

    ///
    /// Store `value` under `name`. The raw slot always takes the new value;
    /// if coercion fails the typed slot is cleared and the failure returned.
    ///
    pub fn write(&mut self, name: &str, value: impl Into<Attribute>) -> Result<(), Error> {
        let key = self.key_or_unknown(name)?;
        let raw = value.into();
        let typed = self.typecast(&key, &raw);

        let (typed, result) = match typed {
            Ok(typed) => {
                obs::record(SchemaEvent::AttributeWritten {
                    model: self.model.name(),
                    attribute: name,
                });
                (typed, Ok(()))
            }
            Err(err) => {
                obs::record(SchemaEvent::CoercionFailed {
                    model: self.model.name(),
                    attribute: name,
                });
                warn!(model = %self.model.name(), attribute = name, error = %err, "coercion failed");
                (None, Err(err))
            }
        };

        self.slots.insert(name.to_string(), Slot { raw, typed });

        result
    }

    fn typecast(&self, key: &Key, raw: &Attribute) -> Result<Option<Attribute>, Error> {
        match (key.ty(), raw) {
            (KeyType::Native(primitive), Attribute::Value(value)) => {
                let typed = self.model.coercer().set(*primitive, value)?;
                Ok((!typed.is_null()).then_some(Attribute::Value(typed)))
            }
            (KeyType::Native(primitive), Attribute::Document(doc)) => Err(
                CoercionError::unsupported(primitive, &Value::Map(doc.attributes())).into(),
            ),
            (KeyType::Embedded(_), Attribute::Value(Value::Null)) => Ok(None),
            (KeyType::Embedded(target), Attribute::Value(Value::Map(attrs))) => {
                let doc = Self::new(target, attrs.clone())?;
                Ok(Some(doc.into()))
            }
            (KeyType::Embedded(target), Attribute::Value(other)) => {
                Err(CoercionError::unsupported(target.name(), other).into())
            }
            (KeyType::Embedded(target), Attribute::Document(doc)) => {
                ensure_model(target, doc)?;
                Ok(Some(raw.clone()))
            }
        }
    }

    ///
    /// Bulk write. Names that are neither keys nor associations are checked
    /// up front against the model's unknown-attribute policy, so a rejected
    /// batch writes nothing.
    ///
    pub fn assign(&mut self, attrs: AttributeMap) -> Result<(), Error> {
        let policy = self.model.unknown_attributes();
        let mut known = AttributeMap::new();

        for (name, value) in attrs {
            if self.model.has_key(&name) || self.model.association(&name).is_some() {
                known.insert(name, value);
                continue;
            }

            obs::record(SchemaEvent::UnknownAttribute {
                model: self.model.name(),
                attribute: &name,
            });

            match policy {
                UnknownAttributes::Reject => {
                    return Err(Error::unknown_attribute(self.model.name(), name));
                }
                UnknownAttributes::Ignore => {
                    warn!(model = %self.model.name(), attribute = %name, "ignored unknown attribute");
                }
            }
        }

        for (name, value) in known {
            if self.model.has_key(&name) {
                self.write(&name, value)?;
            } else {
                self.set_association(&name, value)?;
            }
        }

        Ok(())
    }

    //
    // export
    //

    /// Canonical attribute mapping, in registry order. Absent and null
    /// values are omitted.
    #[must_use]
    pub fn attributes(&self) -> AttributeMap {
        let coercer = self.model.coercer();
        let mut out = AttributeMap::new();

        for key in &self.model.keys() {
            if let Some(attribute) = self.typed_attribute(key, coercer.as_ref()) {
                let value = attribute.to_value();
                if !value.is_null() {
                    out.insert(key.name().to_string(), value);
                }
            }
        }

        out
    }

    /// Attributes plus every held embedded "many" collection.
    #[must_use]
    pub fn flattened(&self) -> AttributeMap {
        let mut out = self.attributes();
        out.extend(self.embedded_association_attributes());

        out
    }
}

fn ensure_model(expected: &Model, doc: &Document) -> Result<(), Error> {
    if doc.model().is_a(expected) {
        Ok(())
    } else {
        Err(Error::ModelMismatch {
            expected: expected.name().to_string(),
            found: doc.model().name().to_string(),
        })
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model && self.attributes() == other.attributes()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.model.name())?;

        let coercer = self.model.coercer();
        for (i, key) in self.model.keys().iter().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            match self.typed_attribute(key, coercer.as_ref()) {
                Some(attribute) => write!(f, "{}: {attribute}", key.name())?,
                None => write!(f, "{}: nil", key.name())?,
            }
        }

        f.write_str(">")
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.flattened())
    }
}
