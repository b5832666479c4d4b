//! Event sink boundary.
//!
//! Model and document code MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through SchemaEvent and EventSink.
use crate::obs::metrics::{self, with_model_mut};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn EventSink>>> = RefCell::new(None);
}

///
/// SchemaEvent
///

#[derive(Clone, Copy, Debug)]
pub enum SchemaEvent<'a> {
    KeyRegistered {
        model: &'a str,
        key: &'a str,
    },
    KeyPropagated {
        model: &'a str,
        subclass: &'a str,
        key: &'a str,
    },
    SubclassTracked {
        parent: &'a str,
        subclass: &'a str,
    },
    AttributeWritten {
        model: &'a str,
        attribute: &'a str,
    },
    CoercionFailed {
        model: &'a str,
        attribute: &'a str,
    },
    UnknownAttribute {
        model: &'a str,
        attribute: &'a str,
    },
    DocumentsFlattened {
        model: &'a str,
        association: &'a str,
        count: u64,
    },
}

///
/// EventSink
///

pub trait EventSink {
    fn record(&self, event: SchemaEvent<'_>);
}

/// GlobalEventSink
/// Default sink that writes into the thread-local counter state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalEventSink;

impl EventSink for GlobalEventSink {
    fn record(&self, event: SchemaEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            SchemaEvent::KeyRegistered { model, .. } => {
                m.ops.keys_registered = m.ops.keys_registered.saturating_add(1);
                with_model_mut(m, model, |c| {
                    c.keys_registered = c.keys_registered.saturating_add(1);
                });
            }

            SchemaEvent::KeyPropagated { subclass, .. } => {
                m.ops.keys_propagated = m.ops.keys_propagated.saturating_add(1);
                with_model_mut(m, subclass, |c| {
                    c.keys_received = c.keys_received.saturating_add(1);
                });
            }

            SchemaEvent::SubclassTracked { parent, .. } => {
                m.ops.subclasses_tracked = m.ops.subclasses_tracked.saturating_add(1);
                with_model_mut(m, parent, |c| c.subclasses = c.subclasses.saturating_add(1));
            }

            SchemaEvent::AttributeWritten { model, .. } => {
                m.ops.attributes_written = m.ops.attributes_written.saturating_add(1);
                with_model_mut(m, model, |c| {
                    c.attributes_written = c.attributes_written.saturating_add(1);
                });
            }

            SchemaEvent::CoercionFailed { model, .. } => {
                m.ops.coercion_failures = m.ops.coercion_failures.saturating_add(1);
                with_model_mut(m, model, |c| {
                    c.coercion_failures = c.coercion_failures.saturating_add(1);
                });
            }

            SchemaEvent::UnknownAttribute { model, .. } => {
                m.ops.unknown_attributes = m.ops.unknown_attributes.saturating_add(1);
                with_model_mut(m, model, |c| {
                    c.unknown_attributes = c.unknown_attributes.saturating_add(1);
                });
            }

            SchemaEvent::DocumentsFlattened { model, count, .. } => {
                m.ops.flatten_calls = m.ops.flatten_calls.saturating_add(1);
                m.ops.documents_flattened = m.ops.documents_flattened.saturating_add(count);
                with_model_mut(m, model, |c| {
                    c.flatten_calls = c.flatten_calls.saturating_add(1);
                    c.documents_flattened = c.documents_flattened.saturating_add(count);
                });
            }
        });
    }
}

pub(crate) const GLOBAL_EVENT_SINK: GlobalEventSink = GlobalEventSink;

pub(crate) fn record(event: SchemaEvent<'_>) {
    // clone out of the slot so a sink may itself record without re-borrowing
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_EVENT_SINK.record(event),
    }
}

/// Snapshot the current thread's counters.
#[must_use]
pub fn event_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset the current thread's counters.
pub fn event_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary sink override on this thread.
pub fn with_event_sink<T>(sink: Rc<dyn EventSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn EventSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        cell::Cell,
        panic::{AssertUnwindSafe, catch_unwind},
    };

    #[derive(Default)]
    struct CountingSink {
        calls: Cell<usize>,
    }

    impl EventSink for CountingSink {
        fn record(&self, _: SchemaEvent<'_>) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    fn written(model: &str) -> SchemaEvent<'_> {
        SchemaEvent::AttributeWritten {
            model,
            attribute: "name",
        }
    }

    #[test]
    fn with_event_sink_routes_and_restores_nested_overrides() {
        event_reset_all();
        let outer = Rc::new(CountingSink::default());
        let inner = Rc::new(CountingSink::default());

        record(written("Person"));
        assert_eq!(outer.calls.get(), 0);

        with_event_sink(outer.clone(), || {
            record(written("Person"));

            with_event_sink(inner.clone(), || {
                record(written("Person"));
            });

            // restored to the outer override
            record(written("Person"));
        });

        assert_eq!(outer.calls.get(), 2);
        assert_eq!(inner.calls.get(), 1);

        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));

        // only the first record reached the global counters
        let report = event_report();
        assert_eq!(report.counters.ops.attributes_written, 1);
    }

    #[test]
    fn with_event_sink_restores_override_on_panic() {
        let sink = Rc::new(CountingSink::default());

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_event_sink(sink.clone(), || {
                record(written("Person"));
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(sink.calls.get(), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn global_sink_keeps_per_model_counters() {
        event_reset_all();

        record(SchemaEvent::KeyPropagated {
            model: "Person",
            subclass: "Employee",
            key: "name",
        });
        record(SchemaEvent::CoercionFailed {
            model: "Person",
            attribute: "age",
        });
        record(SchemaEvent::DocumentsFlattened {
            model: "Blog",
            association: "posts",
            count: 3,
        });
        record(SchemaEvent::DocumentsFlattened {
            model: "Blog",
            association: "posts",
            count: 1,
        });

        let report = event_report();
        assert_eq!(report.counters.ops.keys_propagated, 1);
        assert_eq!(report.counters.ops.coercion_failures, 1);
        assert_eq!(report.counters.ops.documents_flattened, 4);
        assert_eq!(report.counters.models["Employee"].keys_received, 1);
        assert_eq!(report.counters.models["Person"].coercion_failures, 1);

        let blog = report
            .model_counters
            .iter()
            .find(|s| s.model == "Blog")
            .expect("blog summary should be present");
        assert!((blog.avg_documents_per_flatten - 2.0).abs() < f64::EPSILON);
    }
}
