//! Compiled regex and keyword pattern sets used by the security detection
//! engine (`cylestio-security`) and, indirectly, by the interception layer's
//! masking and RCE-extraction paths.
//!
//! Centralizing the patterns here is what keeps the scanner, the masker, the
//! RCE correlator, and the per-vendor interceptors from drifting apart.

mod families;
mod keywords;
mod registry;

pub use families::{PatternFamily, RegexFamily};
pub use keywords::{KeywordCategory, KeywordSet, EXECUTION_INTENT_TERMS, SQL_CONTEXT_TERMS, SQL_SYNTAX_TERMS, SQL_VERBS};
pub use registry::{Match, PatternConfig, PatternRegistry};
