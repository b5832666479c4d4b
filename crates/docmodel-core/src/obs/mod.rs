//! Observability: schema and document event counters, plus the sink they
//! flow through.
//!
//! Model and document code only ever calls `record`; nothing outside this
//! module touches the counter state directly.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, ModelCounters, ModelSummary};
pub use sink::{EventSink, SchemaEvent, event_report, event_reset_all, with_event_sink};

pub(crate) use sink::record;
