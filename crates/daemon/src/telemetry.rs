//! Optional OpenTelemetry export, composed into the subscriber at init
//! time. Enabled by the `telemetry` cargo feature plus the standard
//! `OTEL_EXPORTER_OTLP_ENDPOINT` environment variable.

use anyhow::Result;

/// Build the OTLP tracing layer, or `None` when export is not
/// configured. The caller stacks the result onto its subscriber.
#[cfg(feature = "telemetry")]
pub fn otlp_layer<S>() -> Result<
    Option<tracing_opentelemetry::OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>>,
>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;

    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(None);
    };
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "posterforge".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()?;
    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .build();
    let tracer = provider.tracer(service_name);

    Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer)))
}

/// Without the feature the layer is absent; warn if the operator set an
/// endpoint expecting export to happen.
#[cfg(not(feature = "telemetry"))]
pub fn otlp_layer() -> Result<Option<tracing_subscriber::layer::Identity>> {
    if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        eprintln!("OTLP endpoint set but posterforge was built without the 'telemetry' feature");
    }
    Ok(None)
}
