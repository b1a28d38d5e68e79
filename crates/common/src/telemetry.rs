//! Logging and tracing initialization.
//!
//! Log lines go to stderr so that query output on stdout stays clean for
//! piping. When the `telemetry` feature is enabled, spans are also exported
//! over OTLP/gRPC to a collector.

use anyhow::Result;

#[cfg(feature = "telemetry")]
use {
    opentelemetry::trace::TracerProvider, opentelemetry::KeyValue,
    opentelemetry_otlp::WithExportConfig,
    opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider, opentelemetry_sdk::Resource,
    tracing_opentelemetry::OpenTelemetryLayer,
};

use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const SERVICE_NAME: &str = "fluxgate";

/// Tracing options resolved by a front-end.
#[derive(Debug, Clone, Default)]
pub struct TracingOptions {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `"warn"` or
    /// `"fluxgate_connectors=debug"`.
    pub default_filter: Option<String>,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
    /// OTLP collector endpoint; ignored without the `telemetry` feature.
    pub otlp_endpoint: Option<String>,
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(options: &TracingOptions) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(options.default_filter.as_deref().unwrap_or("warn"))?,
    };

    let text_layer = (!options.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });
    let json_layer = options
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

    let otel_layer = match &options.otlp_endpoint {
        Some(endpoint) => otlp_layer(SERVICE_NAME, endpoint)?,
        None => Box::new(tracing_subscriber::layer::Identity::new()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

pub fn otlp_layer<S>(service_name: &str, endpoint: &str) -> Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    #[cfg(feature = "telemetry")]
    {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                service_name.to_string(),
            )]))
            .build();

        let tracer = provider.tracer(service_name.to_string());
        opentelemetry::global::set_tracer_provider(provider);

        Ok(Box::new(OpenTelemetryLayer::new(tracer)))
    }
    #[cfg(not(feature = "telemetry"))]
    {
        tracing::debug!(
            service_name,
            endpoint,
            "OTLP export requested but the telemetry feature is disabled"
        );
        Ok(Box::new(tracing_subscriber::layer::Identity::new()))
    }
}

pub fn shutdown_tracing() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
