//! glpi-helpdesk - GLPI helpdesk module for the monitoring broker
//!
//! Logs in to the GLPI web service, then serves the helpdesk tools over
//! stdio: the broker delivers broks, the web front-end queries tickets.
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `GLPI_URI`: web service endpoint
//! - `GLPI_LOGIN_NAME`, `GLPI_LOGIN_PASSWORD`: web service account
//! - `GLPI_SOURCE`: provenance tag of created tickets
//!
//! # Usage
//!
//! ```bash
//! GLPI_URI=https://glpi.example.com/plugins/webservices/xmlrpc.php ./glpi-helpdesk
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::{fmt, EnvFilter};

use glpi_helpdesk::{config, helpdesk, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // stdout is reserved for the tool protocol
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("glpi_helpdesk=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting glpi-helpdesk v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        uri = %config.uri,
        login_name = %config.login_name,
        "GLPI web service host:login"
    );

    // Without a session and configuration the module cannot serve anything.
    let helpdesk = helpdesk::Helpdesk::init(&config)
        .await
        .context("Failed to initialize the GLPI helpdesk module")?;

    let server = server::HelpdeskServer::new(Arc::new(helpdesk));

    tracing::info!("Module initialized, starting stdio transport");

    let service = server
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })
        .context("Failed to start server")?;

    tracing::info!("Server running, waiting for requests");

    service
        .waiting()
        .await
        .context("Server error during operation")?;

    tracing::info!("Server shutting down");

    Ok(())
}
