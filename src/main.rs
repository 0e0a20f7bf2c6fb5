use std::sync::Arc;

use tokio::net::TcpListener;

use share_the_meal::adapters::auth::JwtSessionValidator;
use share_the_meal::adapters::http::{build_router, AppState};
use share_the_meal::adapters::postgres::{self, PostgresNotificationRepository, MIGRATOR};
use share_the_meal::adapters::websocket::Hub;
use share_the_meal::config::AppConfig;
use share_the_meal::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);
    tracing::info!(
        environment = ?config.server.environment,
        "Starting share-the-meal backend"
    );

    let pool = postgres::connect(&config.database).await?;
    if config.database.run_migrations {
        MIGRATOR.run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let (hub, hub_task) = Hub::spawn(config.hub.clone());

    let state = AppState::new(
        hub.clone(),
        Arc::new(JwtSessionValidator::new(&config.auth)),
        Arc::new(PostgresNotificationRepository::new(pool)),
    );
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    let signal_hub = hub.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal_hub.shutdown();
        })
        .await?;

    hub.shutdown();
    hub_task.await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
