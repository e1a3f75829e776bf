//! The Interception Framework (C7, §4.7): LLM, tool, process, socket, and
//! HTTP client instrumentation, all funneling through the shared
//! [`framework::instrument`] pattern.

mod framework;
mod http;
mod llm;
mod process;
mod socket;
mod tool;
mod wrapped;

pub use framework::instrument;
pub use http::{call_http, HttpRequest, HttpResponse, HttpSelfTrafficExclusions};
pub use llm::{call_llm, LlmRequest, LlmResponse};
pub use process::{record_process_exec, tracked_env_vars, ContextTracker, ProcessSpawn};
pub use socket::{record_connection, scan_payload, SelfTrafficExclusions, SocketConnection};
pub use tool::{call_tool, ToolCallRequest, ToolCallResponse};
pub use wrapped::{identity_of, WrappedInstances};
