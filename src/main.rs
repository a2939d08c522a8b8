//! Entry point: load config, wire dependencies, and run the server.

use std::sync::Arc;

use authsvc::config::Config;
use authsvc::db::{self, PgUserStore};
use authsvc::repositories::{InMemoryUserStore, UserStore};
use authsvc::{create_app, AppState, AuthService};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.store_timeout).await?;
            let store = PgUserStore::new(pool);
            store.init_schema().await?;
            tracing::info!("using postgres user store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let auth_service = AuthService::from_config(store, &config)?;
    let app = create_app(AppState::new(auth_service)).layer(CorsLayer::permissive());

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
