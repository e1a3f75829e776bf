//! The Relational Store (§4.6, C6): a pooled SQLite database implementing
//! the schema of §3, with transactional write paths and a paginated,
//! filtered, aggregate-capable read surface.

mod error;
mod json;
mod lifecycle;
mod queries;
mod schema;
mod store;
mod txn;
mod writes;

pub use error::{Error, Result};
pub use queries::{
    alerts_by_severity, average_response_time_by_bucket, average_response_time_by_model,
    events_by_channel, events_by_level, events_by_type, get_event, get_llm_call,
    get_performance_metric, get_security_alert, get_tool_call, list_events, slowest_operations,
    token_usage_by_model, AverageResponseTime, EventFilter, EventOrder, EventPage,
    SlowestOperation, TimeBucket, TokenUsage,
};
pub use lifecycle::Lifecycle;
pub use schema::SchemaReport;
pub use store::{resolve_db_path, Store};
pub use writes::{
    log_event_generic, log_llm_call, log_performance_metric, log_security_event, log_tool_call,
};
