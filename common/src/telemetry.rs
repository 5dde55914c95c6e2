use tokio::task::JoinHandle;
use tracing::subscriber::set_global_default;
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// Builds the subscriber used by the canvas service and its tests.
///
/// Spans and events go through three layers on top of a `Registry`:
/// - an `EnvFilter` reading `RUST_LOG`, falling back to `fallback_env_filter`
/// - a `JsonStorageLayer` keeping span fields available to child spans
/// - a bunyan JSON formatter writing to `sink`
///
/// # Arguments
/// - `name`: name of the app, attached to every record
/// - `fallback_env_filter`: level used when `RUST_LOG` is not set
/// - `sink`: where the records are written (stdout, or `std::io::sink` in tests)
pub fn get_tracing_subscriber<Sink>(
    name: String,
    fallback_env_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    // The sink must produce a writer for any lifetime
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_env_filter));

    let formatting_layer = BunyanFormattingLayer::new(name, sink);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Registers the subscriber as the global default and redirects `log` records to it.
///
/// Must only be called once per process.
pub fn init_tracing_subscriber(subscriber: impl Subscriber + Send + Sync) {
    LogTracer::init().expect("Failed to set logger");

    set_global_default(subscriber).expect("Failed to set subscriber");
}

/// Runs a CPU-bound closure on the blocking pool, inside the caller's current span.
///
/// Without it the work would be logged outside of the request span that triggered it.
pub fn spawn_blocking_with_tracing<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let current_span = tracing::Span::current();
    tokio::task::spawn_blocking(move || current_span.in_scope(f))
}
