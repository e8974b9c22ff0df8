//! # Alipay Gateway Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the store adapter and seed the acquirer configuration
//! - Create the gateway service
//! - Start the HTTP server

mod config;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alipay_hex::{GatewayService, GatewaySettings, inbound::HttpServer};
use alipay_repo::build_repo;
use alipay_types::ConfigStore;

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // gRPC exporter with batch processing; the endpoint comes from OTEL_EXPORTER_OTLP_ENDPOINT
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("alipay-gateway"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // OpenTelemetry export only when a collector is configured
    let otel = if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        Some(init_tracer()?)
    } else {
        None
    };
    let (otel_tracer, otel_provider) = match otel {
        Some((tracer, provider)) => (Some(tracer), Some(provider)),
        None => (None, None),
    };
    let telemetry = otel_tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,alipay_app=debug,alipay_hex=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting Alipay gateway on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);
    tracing::info!(
        acquirer_id = %config.acquirer.id,
        environment = %config.acquirer.environment,
        fees_active = config.acquirer.fees.fees_active,
        "Acquirer configured"
    );

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;
    repo.put_acquirer_config(config.acquirer.clone()).await?;

    // Create the gateway service
    let service = GatewayService::new(repo, GatewaySettings::new(config.public_base_url));

    // Create and run the HTTP server
    let server = HttpServer::new(service);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    Ok(())
}
