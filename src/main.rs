use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crmserver::api_router::build_router;
use crmserver::config::AppConfig;
use crmserver::email::analyzer::{JsonDropMailbox, KeywordEmailAnalyzer, Mailbox, UnconfiguredMailbox};
use crmserver::scoring::WeightedLeadScorer;
use crmserver::shared::state::AppState;
use crmserver::shared::utils::create_conn;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let pool = create_conn(&config.database_url())?;
    let mut conn = pool
        .get()
        .context("acquiring connection for migrations")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("running migrations: {e}"))?;
    drop(conn);

    let mailbox: Arc<dyn Mailbox> = match &config.mail_drop_dir {
        Some(dir) => Arc::new(JsonDropMailbox::new(dir.clone())),
        None => Arc::new(UnconfiguredMailbox),
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState {
        conn: pool,
        config,
        lead_scorer: Arc::new(WeightedLeadScorer),
        email_analyzer: Arc::new(KeywordEmailAnalyzer),
        mailbox,
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("crmserver listening on {addr}");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
