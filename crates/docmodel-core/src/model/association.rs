use crate::{error::Error, model::Model};
use docmodel_schema::{error::validate_key_name, types::Cardinality};
use tracing::debug;

///
/// Association
///
/// A named link from one model to another. Only "many" links to embeddable
/// models take part in flattening. The target is held strongly.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Association {
    name: String,
    cardinality: Cardinality,
    target: Model,
}

impl Association {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    #[must_use]
    pub const fn target(&self) -> &Model {
        &self.target
    }

    #[must_use]
    pub const fn is_many(&self) -> bool {
        self.cardinality.is_many()
    }

    /// A "many" link whose target is embeddable.
    #[must_use]
    pub fn is_embedded_many(&self) -> bool {
        self.is_many() && self.target.is_embeddable()
    }
}

impl Model {
    /// Declare a to-one association.
    pub fn one(&self, name: impl Into<String>, target: &Self) -> Result<Association, Error> {
        self.associate(name.into(), Cardinality::One, target)
    }

    /// Declare a to-many association. Embedded "many" links are checked for
    /// cycles back into this model, which would make flattening unbounded.
    pub fn many(&self, name: impl Into<String>, target: &Self) -> Result<Association, Error> {
        self.associate(name.into(), Cardinality::Many, target)
    }

    fn associate(
        &self,
        name: String,
        cardinality: Cardinality,
        target: &Self,
    ) -> Result<Association, Error> {
        validate_key_name(&name)?;
        if let Some(owner) = self.lineage().into_iter().find(|model| model.has_key(&name)) {
            return Err(Error::name_collision(&owner, name));
        }

        let association = Association {
            name,
            cardinality,
            target: target.clone(),
        };

        if association.is_embedded_many()
            && let Some(path) = self.embedded_cycle(target)
        {
            return Err(Error::AssociationCycle {
                model: self.name().to_string(),
                association: association.name,
                path,
            });
        }

        {
            let mut state = self.write_state();
            match state
                .associations
                .iter_mut()
                .find(|a| a.name == association.name)
            {
                Some(slot) => *slot = association.clone(),
                None => state.associations.push(association.clone()),
            }
        }

        debug!(
            model = %self.name(),
            association = %association.name,
            target = %target.name(),
            many = association.is_many(),
            "declared association"
        );

        Ok(association)
    }

    // Depth-first walk over embedded "many" edges starting at `target`.
    // Returns the model path if any reached model is (or derives from) self.
    fn embedded_cycle(&self, target: &Self) -> Option<String> {
        let mut visited: Vec<Self> = Vec::new();
        let mut stack = vec![(target.clone(), vec![self.name().to_string()])];

        while let Some((model, mut path)) = stack.pop() {
            path.push(model.name().to_string());

            if model.is_a(self) {
                return Some(path.join(" -> "));
            }
            if visited.contains(&model) {
                continue;
            }
            visited.push(model.clone());

            for next in model
                .associations()
                .into_iter()
                .filter(Association::is_embedded_many)
            {
                stack.push((next.target, path.clone()));
            }
        }

        None
    }

    /// Associations visible on this model: inherited ones first, with own
    /// declarations replacing inherited ones of the same name.
    #[must_use]
    pub fn associations(&self) -> Vec<Association> {
        let mut out = self
            .inner
            .parent
            .as_ref()
            .map(Self::associations)
            .unwrap_or_default();

        for own in &self.read_state().associations {
            match out.iter_mut().find(|a| a.name == own.name) {
                Some(slot) => *slot = own.clone(),
                None => out.push(own.clone()),
            }
        }

        out
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<Association> {
        self.associations().into_iter().find(|a| a.name == name)
    }

    pub fn embedded_many_associations(&self) -> impl Iterator<Item = Association> {
        self.associations()
            .into_iter()
            .filter(Association::is_embedded_many)
    }
}
