// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use hrm_user_service::{
    config::{connect_db, AppState, Config},
    routes,
    rpc::UserGrpcService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // A missing secret or database URL stops the process here.
    let config = Config::from_env()?;

    let db_pool = connect_db(&config).await?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("failed to run database migrations")?;

    tracing::info!("✅ Database migrations applied");

    let http_addr = config.http_addr;
    let grpc_addr = config.grpc_addr;
    let request_timeout = config.request_timeout;

    let app_state = AppState::new(config, db_pool)?;

    let app = routes::app(app_state.clone());
    let grpc_service = UserGrpcService::new(app_state).into_server();

    let listener = TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", http_addr))?;

    tracing::info!("🚀 HTTP API listening on {}", listener.local_addr()?);
    tracing::info!("🚀 gRPC API listening on {}", grpc_addr);

    let http = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")
    };

    let grpc = async {
        tonic::transport::Server::builder()
            .timeout(request_timeout)
            .add_service(grpc_service)
            .serve_with_shutdown(grpc_addr, shutdown_signal())
            .await
            .context("gRPC server error")
    };

    tokio::try_join!(http, grpc)?;

    tracing::info!("👋 Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("🔥 Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
