use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit trace identifier: 32 lowercase hex characters, no separators.
///
/// Construction is validated (`/^[0-9a-f]{32}$/`); generation lives in
/// `cylestio-trace`, which is the only place with a CSPRNG dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraceId(String);

/// A 64-bit span identifier: 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpanId(String);

fn is_lowercase_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl TraceId {
    pub fn new(raw: impl Into<String>) -> Result<Self, crate::Error> {
        let raw = raw.into();
        if is_lowercase_hex(&raw, 32) {
            Ok(Self(raw))
        } else {
            Err(crate::Error::InvalidId(format!(
                "trace_id must be 32 lowercase hex chars, got {raw:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SpanId {
    pub fn new(raw: impl Into<String>) -> Result<Self, crate::Error> {
        let raw = raw.into();
        if is_lowercase_hex(&raw, 16) {
            Ok(Self(raw))
        } else {
            Err(crate::Error::InvalidId(format!(
                "span_id must be 16 lowercase hex chars, got {raw:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TraceId {
    type Error = crate::Error;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        TraceId::new(value)
    }
}

impl TryFrom<String> for SpanId {
    type Error = crate::Error;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        SpanId::new(value)
    }
}

impl From<TraceId> for String {
    fn from(value: TraceId) -> Self {
        value.0
    }
}

impl From<SpanId> for String {
    fn from(value: SpanId) -> Self {
        value.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(TraceId::new("abc").is_err());
        assert!(SpanId::new("0123456789abcdef0").is_err());
    }

    #[test]
    fn rejects_uppercase() {
        assert!(TraceId::new("A".repeat(32)).is_err());
    }

    #[test]
    fn accepts_well_formed_ids() {
        assert!(TraceId::new("0".repeat(32)).is_ok());
        assert!(SpanId::new("0".repeat(16)).is_ok());
    }
}
