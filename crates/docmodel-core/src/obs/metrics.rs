use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for the current thread.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub models: BTreeMap<String, ModelCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Schema setup
    pub keys_registered: u64,
    pub keys_propagated: u64,
    pub subclasses_tracked: u64,

    // Attribute store
    pub attributes_written: u64,
    pub coercion_failures: u64,
    pub unknown_attributes: u64,

    // Association bridge
    pub flatten_calls: u64,
    pub documents_flattened: u64,
}

///
/// ModelCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ModelCounters {
    pub keys_registered: u64,
    pub keys_received: u64,
    pub subclasses: u64,
    pub attributes_written: u64,
    pub coercion_failures: u64,
    pub unknown_attributes: u64,
    pub flatten_calls: u64,
    pub documents_flattened: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow counters immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow counters mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Borrow one model's counters mutably, creating them on first use.
pub(crate) fn with_model_mut(
    m: &mut EventState,
    model: &str,
    f: impl FnOnce(&mut ModelCounters),
) {
    f(m.models.entry(model.to_string()).or_default());
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventState,
    pub model_counters: Vec<ModelSummary>,
}

///
/// ModelSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub keys_registered: u64,
    pub keys_received: u64,
    pub attributes_written: u64,
    pub coercion_failures: u64,
    pub unknown_attributes: u64,
    pub documents_flattened: u64,
    pub avg_documents_per_flatten: f64,
}

/// Build a report from the in-memory counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut model_counters: Vec<ModelSummary> = snap
        .models
        .iter()
        .map(|(model, c)| ModelSummary {
            model: model.clone(),
            keys_registered: c.keys_registered,
            keys_received: c.keys_received,
            attributes_written: c.attributes_written,
            coercion_failures: c.coercion_failures,
            unknown_attributes: c.unknown_attributes,
            documents_flattened: c.documents_flattened,
            avg_documents_per_flatten: if c.flatten_calls > 0 {
                c.documents_flattened as f64 / c.flatten_calls as f64
            } else {
                0.0
            },
        })
        .collect();

    // busiest models first, then by name
    model_counters.sort_by(|a, b| {
        b.attributes_written
            .cmp(&a.attributes_written)
            .then_with(|| a.model.cmp(&b.model))
    });

    EventReport {
        counters: snap,
        model_counters,
    }
}
