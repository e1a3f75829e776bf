use cylestio_types::{SpanId, TraceId};
use uuid::Uuid;

/// Generate a fresh 128-bit trace ID as 32 lowercase hex characters.
///
/// A v4 UUID's 128 random bits are exactly the width a trace id needs;
/// `Uuid::new_v4` draws from the OS CSPRNG, satisfying the "cryptographically
/// strong RNG" invariant (§4.1) without pulling in a dedicated `rand`
/// dependency the rest of the workspace has no other use for.
pub fn generate_trace_id() -> TraceId {
    let hex = Uuid::new_v4().simple().to_string();
    TraceId::new(hex).expect("uuid v4 simple hex is always 32 lowercase hex chars")
}

/// Generate a fresh 64-bit span ID as 16 lowercase hex characters: the first
/// half of a v4 UUID's hex representation.
pub fn generate_span_id() -> SpanId {
    let hex = Uuid::new_v4().simple().to_string();
    SpanId::new(&hex[..16]).expect("uuid v4 simple hex prefix is always 16 lowercase hex chars")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_round_trip_through_the_validated_newtypes() {
        let _trace = generate_trace_id();
        let _span = generate_span_id();
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(generate_trace_id().as_str(), generate_trace_id().as_str());
        assert_ne!(generate_span_id().as_str(), generate_span_id().as_str());
    }
}
