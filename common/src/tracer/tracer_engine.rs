use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

pub struct TracerOptions {
    /// Level used when `RUST_LOG` is unset.
    pub default_level: LevelFilter,
}

/// This object initialises the stderr tracer, given a TracerOptions struct.
pub struct TracerEngine {
    filter_error: Option<String>,
}

impl TracerEngine {
    /// Initialises the stderr tracer
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(options: TracerOptions) -> Self {
        let stderr_tracer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        let (log_filter, filter_error) = match EnvFilter::builder()
            .with_default_directive(options.default_level.into())
            .from_env()
        {
            Ok(filter) => (filter, None),
            Err(e) => (
                EnvFilter::default().add_directive(options.default_level.into()),
                Some(e.to_string()),
            ),
        };

        let subscriber =
            tracing_subscriber::Registry::default().with(stderr_tracer.with_filter(log_filter));

        //  A second initialisation (e.g. from tests) keeps the first subscriber
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("Global tracing subscriber already set");
        }

        crate::metrics::describe_metrics();

        Self { filter_error }
    }

    pub fn filter_error(&self) -> Option<&str> {
        self.filter_error.as_deref()
    }
}
