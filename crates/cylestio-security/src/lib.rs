//! The Security Detection Engine (§4.3) and RCE Correlator (§4.8): a
//! process-wide pattern-matching scanner plus the shell/HTTP correlation
//! layer that distinguishes benign database traffic from SQL-to-shell RCE
//! attempts.

mod correlator;
mod scanner;

pub use correlator::{
    now_secs, system_now_secs, CorrelationAlert, HttpContext, RceCorrelator, RceSeverity,
    ShellProcess, DEFAULT_CORRELATION_WINDOW_SECS,
};
pub use cylestio_patterns::PatternConfig;
pub use scanner::{extract_text_from_event, ScanResult, Scanner};
