//! Demo app: a user table plus a handful of HTML and JSON endpoints served through webplan.
//!
//! Run from repo root: `cargo run -p demo_app`
//! Configuration overrides are read from the JSON file named by `WEBPLAN_CONFIG`.

mod handlers;
mod models;

use models::User;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use webplan::{load_config_from_env, register, AppState, Database, RouteTable};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = load_config_from_env().await?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_directive())),
        )
        .init();

    let db = Database::connect(&config.db).await?;
    register::<User>()?;
    db.ensure_table::<User>().await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = RouteTable::scan(handlers::NAMESPACE)?.into_router(AppState::new(db.clone(), config));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("server started at http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, closing database pool");
    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
