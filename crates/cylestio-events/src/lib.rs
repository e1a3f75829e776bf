//! Event Builder & Serializer (C4, §4.4) and the two Event Sinks (C5, §4.5).
//!
//! [`EventBuilder::log_event`] fills in whatever a caller's
//! [`cylestio_types::EventBuilderInput`] leaves unset from the current trace
//! context (`cylestio-trace`), then forwards the finished [`Event`] to every
//! configured [`Sink`]. The `serialize` module is the safe-serialization
//! pipeline arbitrary host payloads go through before becoming `attributes`.

mod builder;
mod error;
mod serialize;
mod sink;
mod sinks;
mod wire;

pub use builder::EventBuilder;
pub use cylestio_types::Event;
pub use error::{Error, Result};
pub use serialize::{serialize, Input, PublicFields, SeenSet, ToDict, MAX_DEPTH};
pub use sink::{HttpMethod, Sink};
pub use sinks::{CollectorSink, FileSink, DEFAULT_TIMEOUT};
pub use wire::WireEvent;
