use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

/// Installs the global subscriber: env filter plus JSON lines tagged with the service name.
pub fn config_telemetry(service_name: &'static str) -> anyhow::Result<()> {
    // Needed to forward ordinary log statements to our tracing subscriber.
    tracing_log::LogTracer::init()?;

    let subscriber = Registry::default()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_names(true),
        );

    tracing::subscriber::set_global_default(subscriber)?;
    tracing::info!(service.name = service_name, "telemetry configured");
    Ok(())
}
