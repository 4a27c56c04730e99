use crate::config::Environment;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

/// Initialize the global tracing subscriber: pretty output for development,
/// JSON for production.
///
/// Output goes to stderr. Filtering follows `RUST_LOG` (defaults to "info").
/// An OpenTelemetry layer is always attached; it only exports when a global
/// tracer provider was installed (see [`crate::TelemetryGuard`]).
pub fn setup_logging(environment: Environment) -> anyhow::Result<()> {
    init_subscriber(environment, tracing_opentelemetry::layer())
}

pub(crate) fn init_subscriber<L>(environment: Environment, otel_layer: L) -> anyhow::Result<()>
where
    L: Layer<Layered<EnvFilter, Registry>> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);

    match environment {
        Environment::Production => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
        Environment::Development => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    tracing::debug!(environment = environment.as_str(), "Logging initialized");
    Ok(())
}
