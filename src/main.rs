use anyhow::{Context, Result};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;
use vidseg::{api, config, logging, pipeline::SegmentationService};

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_tracing();
    let config = config::init_config().context("failed to load configuration")?;

    let service = Arc::new(
        SegmentationService::from_config(&config)
            .context("failed to construct video service client")?,
    );

    let report = service.verify_index().await;
    if report.reachable && report.index_found {
        tracing::info!(
            index_id = %report.index_id,
            index_name = report.index_name.as_deref(),
            supports_analysis = report.supports_analysis,
            "Video index verified"
        );
    } else {
        tracing::warn!(
            index_id = %report.index_id,
            reachable = report.reachable,
            error = report.error.as_deref(),
            "Video index could not be verified; continuing"
        );
    }

    let app = api::create_router(service);
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.server_port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.server_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal");
        })
        .await
        .context("HTTP server terminated unexpectedly")?;

    Ok(())
}
