//! `cartage-server`: load configuration, connect, migrate, serve.

use std::sync::Arc;

use cartage::auth::TokenIssuer;
use cartage::db::ClientExecutor;
use cartage::http::ApiService;
use cartage::schema::run_startup_migrations;
use cartage::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::load()?;

    let client = cartage::connect(&cfg.database.url)?;
    let executor = ClientExecutor::new(client);

    // Fail fast: no traffic against a half-migrated schema.
    run_startup_migrations(&executor)?;

    let issuer = TokenIssuer::new(&cfg.auth);
    let service = ApiService::new(Arc::new(executor), Arc::new(issuer));
    service.serve(&cfg.server.bind)?;
    Ok(())
}
