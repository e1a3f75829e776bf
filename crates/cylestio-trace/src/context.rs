use std::cell::RefCell;

use cylestio_types::{SpanId, TraceId};

use crate::ids::{generate_span_id, generate_trace_id};

thread_local! {
    static CONTEXT: RefCell<Option<ContextState>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone)]
struct ContextState {
    trace_id: TraceId,
    agent_id: String,
    current_span_id: Option<SpanId>,
    span_stack: Vec<SpanId>,
}

/// Information returned by [`start_span`]: the span just opened, the
/// (possibly absent) parent it nests under, and the trace it belongs to.
#[derive(Debug, Clone)]
pub struct SpanInfo {
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub trace_id: TraceId,
    pub name: String,
}

/// The current execution's trace context, as read by the event builder
/// (§4.4) to fill in ids on events emitted without explicit overrides.
#[derive(Debug, Clone, Default)]
pub struct CurrentContext {
    pub trace_id: Option<TraceId>,
    pub span_id: Option<SpanId>,
    pub agent_id: Option<String>,
}

/// Per-execution stack of trace/span identifiers (§4.1, §5).
///
/// Backed by thread-local storage: "per logical execution" is left as an
/// implementation choice (thread-local, task-local, or an explicit context
/// value), and thread-local is what maps directly onto OS threads without
/// requiring every call site to carry a context parameter. A host
/// that schedules cooperative tasks on a shared thread is responsible for
/// propagating or resetting this state at task boundaries itself (§5).
pub struct TraceContext;

impl TraceContext {
    /// Start a fresh trace for `agent_id`, discarding any prior state for
    /// this execution (§4.1). Returns the generated trace id.
    pub fn initialize_trace(agent_id: impl Into<String>) -> TraceId {
        let trace_id = generate_trace_id();
        CONTEXT.with(|cell| {
            *cell.borrow_mut() = Some(ContextState {
                trace_id: trace_id.clone(),
                agent_id: agent_id.into(),
                current_span_id: None,
                span_stack: Vec::new(),
            });
        });
        trace_id
    }

    /// Open a new span under the current one, pushing the previous span (if
    /// any) onto the stack (§4.1). If no trace has been initialized for this
    /// execution, a detached trace is created implicitly so the span still
    /// gets a valid `trace_id`.
    pub fn start_span(name: impl Into<String>) -> SpanInfo {
        let span_id = generate_span_id();
        let name = name.into();

        CONTEXT.with(|cell| {
            let mut state = cell.borrow_mut();
            if state.is_none() {
                *state = Some(ContextState {
                    trace_id: generate_trace_id(),
                    agent_id: String::new(),
                    current_span_id: None,
                    span_stack: Vec::new(),
                });
            }
            let state = state.as_mut().unwrap();

            let parent_span_id = state.current_span_id.clone();
            if let Some(parent) = parent_span_id.clone() {
                state.span_stack.push(parent);
            }
            state.current_span_id = Some(span_id.clone());

            SpanInfo {
                span_id,
                parent_span_id,
                trace_id: state.trace_id.clone(),
                name,
            }
        })
    }

    /// Pop the span stack into `current_span_id`, returning the span that
    /// was just ended. A no-op returning `None` if nothing is open (§4.1).
    pub fn end_span() -> Option<SpanId> {
        CONTEXT.with(|cell| {
            let mut state = cell.borrow_mut();
            let Some(state) = state.as_mut() else {
                return None;
            };
            let ended = state.current_span_id.take();
            state.current_span_id = state.span_stack.pop();
            ended
        })
    }

    /// Snapshot of the current execution's context; any field is `None` if
    /// nothing has been initialized or no span is open (§4.1).
    pub fn current_context() -> CurrentContext {
        CONTEXT.with(|cell| match cell.borrow().as_ref() {
            Some(state) => CurrentContext {
                trace_id: Some(state.trace_id.clone()),
                span_id: state.current_span_id.clone(),
                agent_id: if state.agent_id.is_empty() {
                    None
                } else {
                    Some(state.agent_id.clone())
                },
            },
            None => CurrentContext::default(),
        })
    }

    /// Clear all state for this execution (§4.1).
    pub fn reset() {
        CONTEXT.with(|cell| *cell.borrow_mut() = None);
    }

    /// A span id and trace id for an event emitted with no span open: a
    /// detached span with a null parent (§4.1 edge case). Does not mutate
    /// the stack.
    pub fn detached_span() -> (TraceId, SpanId) {
        let context = Self::current_context();
        let trace_id = context.trace_id.unwrap_or_else(generate_trace_id);
        (trace_id, generate_span_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_stack_mirrors_nesting() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let outer = TraceContext::start_span("outer");
        assert!(outer.parent_span_id.is_none());

        let inner = TraceContext::start_span("inner");
        assert_eq!(inner.parent_span_id, Some(outer.span_id.clone()));

        let ended_inner = TraceContext::end_span();
        assert_eq!(ended_inner, Some(inner.span_id));
        assert_eq!(TraceContext::current_context().span_id, Some(outer.span_id.clone()));

        let ended_outer = TraceContext::end_span();
        assert_eq!(ended_outer, Some(outer.span_id));
        assert!(TraceContext::current_context().span_id.is_none());
    }

    #[test]
    fn end_span_with_nothing_open_is_a_noop() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        assert!(TraceContext::end_span().is_none());
    }

    #[test]
    fn detached_span_before_any_span_has_null_parent() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let (trace_id, span_id) = TraceContext::detached_span();
        let context = TraceContext::current_context();
        assert_eq!(Some(trace_id), context.trace_id);
        assert_ne!(Some(span_id), context.span_id);
    }

    #[test]
    fn reset_clears_everything() {
        TraceContext::initialize_trace("agent-1");
        TraceContext::start_span("a");
        TraceContext::reset();
        let context = TraceContext::current_context();
        assert!(context.trace_id.is_none());
        assert!(context.span_id.is_none());
        assert!(context.agent_id.is_none());
    }
}
