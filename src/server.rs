//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that open the
//! database and wire it into the [`LogTools`] handler.

use anyhow::{Context, Result};
use logstore::config::LogStoreConfig;
use logstore::db;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

use crate::tools::LogTools;

/// Shared setup: open the database and wrap connection and config for sharing.
fn setup_shared_state(
    config: LogStoreConfig,
) -> Result<(Arc<Mutex<rusqlite::Connection>>, Arc<LogStoreConfig>)> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(
        db = %db_path.display(),
        auto_sweep_hours = config.retention.auto_sweep_hours,
        "database ready"
    );

    Ok((Arc::new(Mutex::new(conn)), Arc::new(config)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: LogStoreConfig) -> Result<()> {
    tracing::info!("starting logstore MCP server on stdio");

    let (db, config) = setup_shared_state(config)?;

    let tools = LogTools::new(db, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP, mounted at `/mcp`.
pub async fn serve_http(config: LogStoreConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting logstore MCP server on HTTP");

    let (db, config) = setup_shared_state(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(LogTools::new(db.clone(), config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
