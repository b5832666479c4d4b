use crate::{
    coerce::CoercionError,
    document::{Document, ensure_model},
    error::Error,
    model::Association,
    obs::{self, SchemaEvent},
    value::{AttributeMap, Value},
};
use docmodel_schema::types::Cardinality;

///
/// AssociationValue
///
/// What a document currently holds for one association. A missing entry
/// means the association was never set.
///

#[derive(Clone, Debug, PartialEq)]
pub enum AssociationValue {
    One(Option<Box<Document>>),
    Many(Vec<Document>),
}

impl AssociationValue {
    /// Held documents, regardless of cardinality.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        match self {
            Self::One(Some(doc)) => std::slice::from_ref(&**doc),
            Self::One(None) => &[],
            Self::Many(docs) => docs,
        }
    }
}

impl Document {
    fn association_or_unknown(&self, name: &str) -> Result<Association, Error> {
        self.model
            .association(name)
            .ok_or_else(|| Error::unknown_association(self.model.name(), name))
    }

    /// Pull every association-named entry out of `attrs` and set it through
    /// the bridge, leaving only plain attributes behind.
    pub fn initialize_associations(&mut self, attrs: &mut AttributeMap) -> Result<(), Error> {
        for association in self.model.associations() {
            if let Some(value) = attrs.remove(association.name()) {
                self.set_association(association.name(), value)?;
            }
        }

        Ok(())
    }

    ///
    /// Set an association from a plain value. One takes `Null` or a map;
    /// Many takes `Null` or a list of maps. `Null` drops whatever was held.
    ///
    pub fn set_association(&mut self, name: &str, value: Value) -> Result<(), Error> {
        let association = self.association_or_unknown(name)?;
        let target = association.target();

        let held = match (association.cardinality(), value) {
            (_, Value::Null) => {
                self.associations.remove(name);
                return Ok(());
            }
            (Cardinality::One, Value::Map(attrs)) => {
                AssociationValue::One(Some(Box::new(Self::new(target, attrs)?)))
            }
            (Cardinality::Many, Value::List(items)) => AssociationValue::Many(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Map(attrs) => Self::new(target, attrs),
                        other => Err(CoercionError::unsupported(target.name(), &other).into()),
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (_, other) => return Err(CoercionError::unsupported(target.name(), &other).into()),
        };

        self.associations.insert(name.to_string(), held);

        Ok(())
    }

    /// Set an association from already-built documents. A One association
    /// accepts at most one.
    pub fn set_documents(&mut self, name: &str, docs: Vec<Self>) -> Result<(), Error> {
        let association = self.association_or_unknown(name)?;
        for doc in &docs {
            ensure_model(association.target(), doc)?;
        }

        let held = match association.cardinality() {
            Cardinality::Many => AssociationValue::Many(docs),
            Cardinality::One if docs.len() <= 1 => {
                AssociationValue::One(docs.into_iter().next().map(Box::new))
            }
            Cardinality::One => {
                return Err(Error::CardinalityMismatch {
                    model: self.model.name().to_string(),
                    association: name.to_string(),
                    expected: Cardinality::Many,
                });
            }
        };

        self.associations.insert(name.to_string(), held);

        Ok(())
    }

    /// Append one document to a Many association.
    pub fn push(&mut self, name: &str, doc: Self) -> Result<(), Error> {
        let association = self.association_or_unknown(name)?;
        if !association.is_many() {
            return Err(Error::CardinalityMismatch {
                model: self.model.name().to_string(),
                association: name.to_string(),
                expected: Cardinality::Many,
            });
        }
        ensure_model(association.target(), &doc)?;

        match self.associations.get_mut(name) {
            Some(AssociationValue::Many(docs)) => docs.push(doc),
            _ => {
                self.associations
                    .insert(name.to_string(), AssociationValue::Many(vec![doc]));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationValue> {
        self.associations.get(name)
    }

    ///
    /// Every held embedded "many" collection, keyed by association name.
    /// Each element is the child's own attributes merged with its own
    /// embedded collections, so nesting depth is unbounded.
    ///
    #[must_use]
    pub fn embedded_association_attributes(&self) -> AttributeMap {
        let mut out = AttributeMap::new();

        for association in self.model.embedded_many_associations() {
            let Some(AssociationValue::Many(docs)) = self.associations.get(association.name())
            else {
                continue;
            };

            obs::record(SchemaEvent::DocumentsFlattened {
                model: self.model.name(),
                association: association.name(),
                count: docs.len() as u64,
            });

            let items = docs.iter().map(|doc| Value::Map(doc.flattened())).collect();
            out.insert(association.name().to_string(), Value::List(items));
        }

        out
    }
}
