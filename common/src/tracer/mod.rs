mod tracer_engine;

pub use tracer_engine::{TracerEngine, TracerOptions};

/// Should be called at the start of each binary.
/// Expands to a `TracerEngine` built with the given default level,
/// logging a warning from the calling module if `RUST_LOG` could not be parsed.
#[macro_export]
macro_rules! init_tracer {
    ($level:expr) => {{
        let tracer = $crate::tracer::TracerEngine::new($crate::tracer::TracerOptions {
            default_level: $level,
        });
        if let Some(e) = tracer.filter_error() {
            tracing::warn!("Invalid directive(s) in RUST_LOG: {e}");
        }
        tracer
    }};
}
