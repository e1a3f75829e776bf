//! The Trace Context Engine (§4.1): a per-execution stack of trace/span
//! identifiers that every emitted event inherits.

mod context;
mod ids;

pub use context::{CurrentContext, SpanInfo, TraceContext};
pub use ids::{generate_span_id, generate_trace_id};
