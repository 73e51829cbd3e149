use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chimon::adapters::{ClickHouseFetcherFactory, InstallationNormalizer, TomlFileSource};
use chimon::application::{should_watch, Exporter, Registry};
use chimon::config::Config;
use chimon::interface::http::{create_router, AppState, Endpoints};
use chimon::ports::{Normalizer, ResourceSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chimon={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting chimon v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let registry = Arc::new(Registry::new());
    let fetchers = Arc::new(ClickHouseFetcherFactory::new()?);
    let exporter = Arc::new(Exporter::new(
        registry,
        fetchers,
        config.connection_params(),
        config.collection_timeout,
    ));

    // Discovery
    match &config.discovery_file {
        Some(path) => {
            let source: Arc<dyn ResourceSource> = Arc::new(TomlFileSource::new(path.clone()));
            let normalizer: Arc<dyn Normalizer> = Arc::new(InstallationNormalizer::default());

            if config.discovery_enabled() {
                info!(path = %path.display(), interval = ?config.discovery_interval, "Discovery enabled");
                tokio::spawn(exporter.clone().run_discovery(source, normalizer, config.discovery_interval));
            } else {
                match exporter
                    .refresh_from_source(source.as_ref(), should_watch, normalizer.as_ref())
                    .await
                {
                    Ok(report) => info!(upserted = report.upserted, "One-shot discovery completed"),
                    Err(e) => warn!(error = %e, "One-shot discovery failed"),
                }
            }
        }
        None => info!("No discovery file configured; registry is fed by the control API only"),
    }

    let state = AppState::new(exporter);

    if config.single_listener() {
        let app = create_router(
            state,
            Endpoints {
                metrics: Some(config.metrics_path.as_str()),
                control: Some(config.control_path.as_str()),
            },
        );
        let addr = format!("0.0.0.0:{}", config.metrics_port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("chimon listening on {}", addr);
        info!("  -> Metrics: http://localhost:{}{}", config.metrics_port, config.metrics_path);
        info!("  -> Control: http://localhost:{}{}", config.control_port, config.control_path);

        axum::serve(listener, app).await?;
    } else {
        let metrics_app = create_router(
            state.clone(),
            Endpoints {
                metrics: Some(config.metrics_path.as_str()),
                control: None,
            },
        );
        let control_app = create_router(
            state,
            Endpoints {
                metrics: None,
                control: Some(config.control_path.as_str()),
            },
        );

        let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.metrics_port)).await?;
        let control_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.control_port)).await?;

        info!("  -> Metrics: http://localhost:{}{}", config.metrics_port, config.metrics_path);
        info!("  -> Control: http://localhost:{}{}", config.control_port, config.control_path);

        tokio::try_join!(
            async { axum::serve(metrics_listener, metrics_app).await },
            async { axum::serve(control_listener, control_app).await },
        )?;
    }

    Ok(())
}
