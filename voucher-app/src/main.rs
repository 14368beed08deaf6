//! # Voucher Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the ledger adapter and the card processor adapter
//! - Create the charge service and its metrics
//! - Start the HTTP server

mod config;

use opentelemetry::global;
use opentelemetry_sdk::{
    metrics::SdkMeterProvider, propagation::TraceContextPropagator, trace as sdktrace,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use card_gateway::StripeGateway;
use voucher_hex::{ChargeMetrics, ChargeService, inbound::HttpServer};
use voucher_repo::build_repo;

/// OTLP exporters, present only when a collector endpoint is configured.
struct Telemetry {
    tracer_provider: sdktrace::SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    fn shutdown(self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            eprintln!("failed to flush traces: {e}");
        }
        if let Err(e) = self.meter_provider.shutdown() {
            eprintln!("failed to flush metrics: {e}");
        }
    }
}

fn init_telemetry() -> anyhow::Result<Option<(sdktrace::Tracer, Telemetry)>> {
    if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_none() {
        return Ok(None);
    }

    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let span_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;
    let tracer_provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .build();
    global::set_tracer_provider(tracer_provider.clone());

    // Feeds the HTTP metrics layer on the router
    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .build()?;
    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(metric_exporter)
        .build();
    global::set_meter_provider(meter_provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    let tracer = tracer_provider.tracer("voucher-service");
    Ok(Some((
        tracer,
        Telemetry {
            tracer_provider,
            meter_provider,
        },
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize OpenTelemetry tracing when a collector is configured
    let (otel_tracer, telemetry) = init_telemetry()?.unzip();
    let otel_layer = otel_tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,voucher_app=debug,voucher_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting voucher server on port {}", config.port);
    tracing::info!(
        "Using database: {}",
        config.database_url.split(':').next().unwrap_or("unknown")
    );

    // Build ledger (handles connection and migration)
    let ledger = build_repo(&config.database_url).await?;

    // Card processor adapter
    let gateway = StripeGateway::new(config.stripe())?;

    let metrics = ChargeMetrics::new()?;
    let service = ChargeService::new(ledger, gateway, metrics);

    // Create and run the HTTP server
    let server = HttpServer::with_rate_limit(service, config.rate_limit_per_minute);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some(telemetry) = telemetry {
        telemetry.shutdown();
    }
    Ok(())
}
