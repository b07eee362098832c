use anyhow::Result;
use clap::Parser;
use synsearch_core::QueryService;
use synsearch_server::build_app;
use synsearch_server::config::{Args, Store};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let addr = args.addr()?;

    let store = Store::open(&args.backend()?).await?;
    let app = build_app(QueryService::new(store.index.clone()));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    let served = axum::serve(listener, app).with_graceful_shutdown(wait_for_signal()).await;

    store.close().await;
    tracing::info!("shutdown complete");
    served?;
    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received, draining connections");
}
