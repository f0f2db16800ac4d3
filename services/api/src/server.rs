use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAssetStore};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_board::board::{JobBoard, MemoryBoardStore, QueuedNotifier, TracingNotifier};
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryBoardStore::new());
    let (notifier, delivery) = QueuedNotifier::spawn(Arc::new(TracingNotifier::new(
        config.notifications.sender.clone(),
    )));
    let assets = Arc::new(InMemoryAssetStore::new(config.assets.base_url.clone()));
    let board = Arc::new(JobBoard::new(store, Arc::new(notifier), assets.clone()));

    let app = with_service_routes(board)
        .layer(Extension(app_state))
        .layer(Extension(assets))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, assets = %config.assets.base_url, "job board service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    // serve has dropped the router, and with it every queue sender
    drain_notifications(delivery).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "unable to listen for ctrl-c; serving until the listener fails");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested, finishing in-flight requests");
}

/// Wait until the delivery task has flushed the queue. Returns only once every
/// `QueuedNotifier` sender is gone.
pub(crate) async fn drain_notifications(delivery: JoinHandle<()>) {
    match delivery.await {
        Ok(()) => info!("notification queue drained"),
        Err(error) => warn!(%error, "notification delivery task ended abnormally"),
    }
}
