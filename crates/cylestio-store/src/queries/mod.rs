mod aggregates;
mod detail;
mod events;

pub use aggregates::{
    alerts_by_severity, average_response_time_by_bucket, average_response_time_by_model,
    events_by_channel, events_by_level, events_by_type, slowest_operations, token_usage_by_model,
    AverageResponseTime, SlowestOperation, TimeBucket, TokenUsage,
};
pub use detail::{get_llm_call, get_performance_metric, get_security_alert, get_tool_call};
pub use events::{get_event, list_events, EventFilter, EventOrder, EventPage};
