use cylestio_types::Event;

use crate::Result;

/// An output of the event pipeline (§4.5). Every sink is best-effort: a
/// failing sink logs and moves on, it never aborts the caller's work.
pub trait Sink: Send + Sync {
    fn send(&self, event: &Event) -> Result<()>;
}

/// HTTP verb for the collector sink (§4.5: "POST (or PUT) JSON body").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
    Put,
}
