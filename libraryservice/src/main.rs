use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use libraryservice::app_config::config_app;
use libraryservice::records_repository::{InMemoryRecordsRepository, RecordsRepository};
use libraryservice::settings::{Settings, TelemetrySettings};

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let app_name = settings.service_name.clone();

    // Spans are exported in batch to a local Jaeger agent, only when asked for
    let telemetry = if settings.jaeger_enabled {
        global::set_text_map_propagator(TraceContextPropagator::new());
        #[allow(deprecated)]
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name(app_name.clone())
            .install_batch(TokioCurrentThread)
            .context("Failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    // Filter based on level - trace, debug, info, warn, error
    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new(app_name, std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install `tracing` subscriber")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_telemetry(&settings.telemetry)?;

    let records_repository: Arc<dyn RecordsRepository> = Arc::new(
        InMemoryRecordsRepository::from_files(
            &settings.data.books_path,
            &settings.data.users_path,
        )
        .context("Failed to load library records")?,
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(records_repository.clone()))
            .wrap(TracingLogger::default())
            .configure(config_app)
    })
    .bind((settings.server.host.as_str(), settings.server.port))
    .with_context(|| format!("Failed to bind port {}", settings.server.port))?;

    tracing::info!("Server is running on port {}", settings.server.port);
    server.run().await.context("HTTP server failed")
}
