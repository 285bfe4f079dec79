use serde_json::Value;

use crate::processor::{Args, ProcessorRef};

/// Initialize tracing for tests with appropriate settings
#[inline]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// A processor with no arguments in a throwaway image.
pub fn proc(class_name: &str) -> ProcessorRef {
    ProcessorRef::new(class_name, "img")
}

/// Convert a JSON object literal into processor arguments.
pub fn args(value: Value) -> Args {
    value.as_object().cloned().unwrap_or_default()
}
