mod collector;
mod file;

pub use collector::{CollectorSink, DEFAULT_TIMEOUT};
pub use file::FileSink;
