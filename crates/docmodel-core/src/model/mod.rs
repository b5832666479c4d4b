//! Runtime document models.
//!
//! A `Model` is the class-level half of the system: its key registry, the
//! submodels it propagates registrations to, its associations, and the
//! coercer its documents use. Models are cheap `Arc` handles; cloning one
//! shares the same state.
//!
//! Registration is a setup-phase activity. Declaring keys on one hierarchy
//! from several threads at once is unsupported and must be serialized by the
//! caller; once setup is finished the registries are read-only and can be
//! shared freely.
//!
//! Schemas are process-lifetime state. Association targets and embedded key
//! types hold their models strongly, so a schema whose links loop back on
//! itself is never freed. Only the submodel lists are weak, which lets a
//! dropped submodel stop receiving propagated keys.

mod association;
mod key;


pub use association::Association;
pub use key::{Key, KeyRegistry, KeyType};

use crate::{
    coerce::{Coercer, NativeCoercer},
    error::Error,
    obs::{self, SchemaEvent},
};
use derive_more::Display;
use docmodel_schema::{
    index::IndexRequest, options::KeyOptions, rule::ValidationRequest,
};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    iter,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};
use tracing::debug;

///
/// ModelKind
///
/// `Document` models are persisted at top level; `Embedded` models only
/// ever live inside another document.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    Document,
    Embedded,
}

///
/// UnknownAttributes
///
/// What bulk assignment does with names missing from the registry.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownAttributes {
    #[default]
    Reject,
    Ignore,
}

///
/// Model
///

#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

struct ModelInner {
    name: String,
    kind: ModelKind,
    parent: Option<Model>,
    state: RwLock<ModelState>,
}

struct ModelState {
    // None until this model registers a key of its own
    keys: Option<KeyRegistry>,
    subclasses: Vec<Weak<ModelInner>>,
    associations: Vec<Association>,
    // None on submodels until overridden; resolved through the ancestry
    coercer: Option<Arc<dyn Coercer>>,
    unknown_attributes: Option<UnknownAttributes>,
}

impl ModelState {
    fn live_subclasses(&self) -> Vec<Model> {
        self.subclasses
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| Model { inner })
            .collect()
    }
}

impl Model {
    /// Root model for top-level persistable documents.
    #[must_use]
    pub fn document(name: impl Into<String>) -> Self {
        Self::root(name.into(), ModelKind::Document)
    }

    /// Root model for documents that only exist embedded in others.
    #[must_use]
    pub fn embedded(name: impl Into<String>) -> Self {
        Self::root(name.into(), ModelKind::Embedded)
    }

    fn root(name: String, kind: ModelKind) -> Self {
        let model = Self::build(name, kind, None);
        {
            let mut state = model.write_state();
            state.coercer = Some(Arc::new(NativeCoercer));
            state.unknown_attributes = Some(UnknownAttributes::default());
        }

        model
    }

    ///
    /// Derive a submodel. This is the inheritance event: the new model is
    /// appended to the parent's submodel list and from then on receives
    /// every key the parent registers. Kind is fixed at creation; coercer
    /// and unknown-attribute policy follow the parent until overridden here.
    ///
    #[must_use]
    pub fn inherit(parent: &Self, name: impl Into<String>) -> Self {
        let child = Self::build(name.into(), parent.kind(), Some(parent.clone()));

        parent
            .write_state()
            .subclasses
            .push(Arc::downgrade(&child.inner));

        obs::record(SchemaEvent::SubclassTracked {
            parent: parent.name(),
            subclass: child.name(),
        });
        debug!(parent = %parent.name(), subclass = %child.name(), "tracked submodel");

        child
    }

    fn build(name: String, kind: ModelKind, parent: Option<Self>) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                name,
                kind,
                parent,
                state: RwLock::new(ModelState {
                    keys: None,
                    subclasses: Vec::new(),
                    associations: Vec::new(),
                    coercer: None,
                    unknown_attributes: None,
                }),
            }),
        }
    }

    /// Replace the coercer used by this model's documents and by those of
    /// every submodel that has not set its own.
    #[must_use]
    pub fn with_coercer(self, coercer: impl Coercer + 'static) -> Self {
        self.write_state().coercer = Some(Arc::new(coercer));
        self
    }

    #[must_use]
    pub fn with_unknown_attributes(self, policy: UnknownAttributes) -> Self {
        self.write_state().unknown_attributes = Some(policy);
        self
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ModelState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    //
    // identity
    //

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.inner.kind
    }

    #[must_use]
    pub fn is_embeddable(&self) -> bool {
        self.inner.kind == ModelKind::Embedded
    }

    #[must_use]
    pub fn parent_model(&self) -> Option<Self> {
        self.inner.parent.clone()
    }

    /// This model followed by each ancestor, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = &Self> {
        iter::successors(Some(self), |model| model.inner.parent.as_ref())
    }

    /// True if `self` is `other` or derives from it.
    #[must_use]
    pub fn is_a(&self, other: &Self) -> bool {
        self.ancestry().any(|model| model == other)
    }

    #[must_use]
    pub fn subclasses(&self) -> Vec<Self> {
        self.read_state().live_subclasses()
    }

    // self, then every live submodel below it, breadth first
    pub(crate) fn lineage(&self) -> Vec<Self> {
        let mut out = vec![self.clone()];
        let mut next = 0;
        while let Some(model) = out.get(next) {
            let subclasses = model.subclasses();
            out.extend(subclasses);
            next += 1;
        }

        out
    }

    /// Nearest coercer set on this model or an ancestor.
    #[must_use]
    pub fn coercer(&self) -> Arc<dyn Coercer> {
        self.ancestry()
            .find_map(|model| model.read_state().coercer.clone())
            .unwrap_or_else(|| Arc::new(NativeCoercer))
    }

    #[must_use]
    pub fn unknown_attributes(&self) -> UnknownAttributes {
        self.ancestry()
            .find_map(|model| model.read_state().unknown_attributes)
            .unwrap_or_default()
    }

    //
    // keys
    //

    ///
    /// Register a key. The definition is validated first; on success it is
    /// inserted into (or replaces its namesake in) this model's registry and
    /// then re-registered on every tracked submodel. A name already used by
    /// an association anywhere in that subtree is rejected.
    ///
    pub fn key(
        &self,
        name: impl Into<String>,
        ty: impl Into<KeyType>,
        options: KeyOptions,
    ) -> Result<Key, Error> {
        let key = Key::new(name, ty, options)?;
        if let Some(owner) = self
            .lineage()
            .into_iter()
            .find(|model| model.association(key.name()).is_some())
        {
            return Err(Error::name_collision(&owner, key.name()));
        }
        self.register(&key);

        Ok(key)
    }

    fn register(&self, key: &Key) {
        let seed = if self.read_state().keys.is_none() {
            Some(self.inherited_keys())
        } else {
            None
        };

        // the lock is released before any submodel is touched
        let subclasses = {
            let mut state = self.write_state();
            state
                .keys
                .get_or_insert_with(|| seed.unwrap_or_default())
                .insert(key.clone());
            state.live_subclasses()
        };

        obs::record(SchemaEvent::KeyRegistered {
            model: self.name(),
            key: key.name(),
        });
        debug!(model = %self.name(), key = %key.name(), ty = %key.ty(), "registered key");

        for subclass in subclasses {
            obs::record(SchemaEvent::KeyPropagated {
                model: self.name(),
                subclass: subclass.name(),
                key: key.name(),
            });
            subclass.register(key);
        }
    }

    fn inherited_keys(&self) -> KeyRegistry {
        self.inner
            .parent
            .as_ref()
            .map(Self::keys)
            .unwrap_or_default()
    }

    // Own registry if one exists, else the nearest ancestor's.
    fn with_registry<R>(&self, f: impl FnOnce(&KeyRegistry) -> R) -> R {
        let state = self.read_state();
        if let Some(keys) = &state.keys {
            return f(keys);
        }
        drop(state);

        match &self.inner.parent {
            Some(parent) => parent.with_registry(f),
            None => f(&KeyRegistry::new()),
        }
    }

    /// Copy of the effective registry, in registration order.
    #[must_use]
    pub fn keys(&self) -> KeyRegistry {
        self.with_registry(Clone::clone)
    }

    #[must_use]
    pub fn key_definition(&self, name: &str) -> Option<Key> {
        self.with_registry(|keys| keys.get(name).cloned())
    }

    #[must_use]
    pub fn has_key(&self, name: &str) -> bool {
        self.with_registry(|keys| keys.contains(name))
    }

    /// Whether this model has registered a key directly (and so owns a copy).
    #[must_use]
    pub fn owns_keys(&self) -> bool {
        self.read_state().keys.is_some()
    }

    //
    // derived requests
    //

    #[must_use]
    pub fn validation_requests(&self) -> Vec<ValidationRequest> {
        self.with_registry(|keys| {
            keys.iter()
                .flat_map(|key| key.validation_requests().iter().cloned())
                .collect()
        })
    }

    /// Embedded models have no collection of their own, so they request none.
    #[must_use]
    pub fn index_requests(&self) -> Vec<IndexRequest> {
        if self.is_embeddable() {
            return Vec::new();
        }

        self.with_registry(|keys| keys.iter().filter_map(Key::index_request).collect())
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.kind)
            .field("parent", &self.inner.parent.as_ref().map(Self::name))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
