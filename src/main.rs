//! OpenSASE Apparel - self-hosted clothing storefront

use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_apparel::auth::{ensure_admin, TokenSigner};
use opensase_apparel::config::AppConfig;
use opensase_apparel::events::EventPublisher;
use opensase_apparel::store::{MemoryStore, PgStore, Store};
use opensase_apparel::{app, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url, config.db_max_connections).await.context("failed to connect to database")?;
            pg.migrate().await.context("failed to run migrations")?;
            tracing::info!(max_connections = config.db_max_connections, "Connected to PostgreSQL");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    store.ping().await.context("store health check failed")?;

    if let Some(admin) = &config.admin {
        match ensure_admin(store.as_ref(), &admin.email, admin.password.expose_secret()).await {
            Ok(Some(user)) => tracing::info!(user_id = %user.id, email = %user.email, "Admin account created"),
            Ok(None) => tracing::debug!(email = %admin.email, "Admin account already present"),
            Err(e) => return Err(anyhow::anyhow!("failed to provision admin: {e}")),
        }
    }

    let events = match &config.nats_url {
        Some(url) => EventPublisher::connect(url).await,
        None => EventPublisher::disabled(),
    };

    let tokens = TokenSigner::new(config.jwt_secret.clone(), chrono::Duration::days(config.token_ttl_days));
    let state = AppState::new(store, tokens, events);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 OpenSASE Apparel listening on {}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
