//! # GLPI helpdesk
//!
//! A monitoring broker module that links monitored hosts to GLPI assets and
//! forwards ticket operations to the GLPI webservices plugin.
//!
//! ## Features
//!
//! - **Host cache**: `initial_host_status` broks map each host to the GLPI
//!   asset named by its `_HOSTID`, `_ITEMTYPE`, `_ITEMSID` and `_ENTITIESID`
//!   custom variables
//! - **Ticket queries**: list the tickets of a host, fetch one ticket
//! - **Ticket mutations**: create tickets and follow-ups tagged with a source
//! - **Front-end facade**: session, helpdesk configuration and web link for the UI
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error types with password sanitization
//! - [`glpi_client`] - Remote endpoint client (login + procedure calls)
//! - [`helpdesk`] - Host cache, brok handling and ticket operations
//! - [`server`] - Tool server exposing the facade and brok intake
//! - [`models`] - Broks, cache entries and procedure parameter schemas
//! - [`tools`] - Tool input parameter structs
//! - [`xmlrpc`] - XML-RPC request/response codec
//!
//! ## Configuration
//!
//! - `GLPI_URI`: web service endpoint (default `http://localhost/glpi/plugins/webservices/xmlrpc.php`)
//! - `GLPI_LOGIN_NAME` / `GLPI_LOGIN_PASSWORD`: web service account
//! - `GLPI_SOURCE`: provenance tag of created tickets
//! - `RUST_LOG`: log level (e.g., `glpi_helpdesk=debug`)
//!
//! ## Example
//!
//! ```ignore
//! use glpi_helpdesk::config::Config;
//! use glpi_helpdesk::helpdesk::Helpdesk;
//! use glpi_helpdesk::models::Brok;
//!
//! async fn example() -> Result<(), glpi_helpdesk::error::HelpdeskError> {
//!     let helpdesk = Helpdesk::init(&Config::from_env()?).await?;
//!
//!     let brok: Brok = serde_json::from_str(r#"{"type": "initial_host_status",
//!         "data": {"host_name": "srv1", "customs": {"_HOSTID": "1",
//!         "_ITEMTYPE": "Computer", "_ITEMSID": "42", "_ENTITIESID": "0"}}}"#)?;
//!     helpdesk.manage_brok(&brok).await;
//!
//!     if let Some(tickets) = helpdesk.get_tickets(Some("srv1"), Some("notclosed"), 10, true).await {
//!         println!("{} open tickets", tickets.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod glpi_client;
pub mod helpdesk;
pub mod models;
pub mod server;
pub mod tools;
pub mod xmlrpc;
