//! Tool server for the GLPI helpdesk module.
//!
//! This module defines the `HelpdeskServer` struct that implements the MCP
//! `ServerHandler` trait. The broker pushes broks through `manage_brok`;
//! the web front-end uses the `get_ui_*` / `set_ui_*` tools.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Serialize;

use crate::helpdesk::Helpdesk;
use crate::models::Identifier;
use crate::tools::{GetTicketInput, GetTicketsInput, ManageBrokInput, SubmissionInput};

/// The helpdesk tool server.
#[derive(Clone)]
pub struct HelpdeskServer {
    /// Shared helpdesk state.
    helpdesk: Arc<Helpdesk>,
    /// Tool router for MCP tool dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl HelpdeskServer {
    /// Creates a new server instance around an initialized helpdesk.
    pub fn new(helpdesk: Arc<Helpdesk>) -> Self {
        Self {
            helpdesk,
            tool_router: Self::tool_router(),
        }
    }

    /// Returns "pong" on success.
    #[tool(description = "Test connectivity to the helpdesk module. Returns 'pong' if the server is running correctly.")]
    fn ping(&self) -> String {
        tracing::debug!("ping tool called");
        "pong".to_string()
    }

    /// Feeds one brok to the host cache. Never fails from the caller's view.
    #[tool(description = "Deliver a broker event (brok). Recognised types: initial_host_status, schedule_host_downtime, schedule_service_downtime. Other types are ignored.")]
    async fn manage_brok(&self, Parameters(input): Parameters<ManageBrokInput>) -> String {
        let brok = input.into_brok();
        tracing::debug!(brok_type = %brok.kind, "manage_brok tool called");
        self.helpdesk.manage_brok(&brok).await;
        "ok".to_string()
    }

    #[tool(description = "Get the current GLPI session token.")]
    fn get_ui_session(&self) -> String {
        self.helpdesk.get_ui_session().to_string()
    }

    #[tool(description = "Get the GLPI helpdesk configuration loaded at startup, including the session token.")]
    fn get_ui_helpdesk_configuration(&self) -> String {
        render_json(self.helpdesk.get_ui_helpdesk_configuration())
    }

    /// Fetches one ticket. `null` when it cannot be fetched.
    #[tool(description = "Get one GLPI ticket by id, with names resolved. Returns null if the ticket cannot be fetched.")]
    async fn get_ui_ticket(
        &self,
        Parameters(input): Parameters<GetTicketInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "get_ui_ticket tool called");

        if input.ticket_id.is_empty() {
            return Err("ticket_id is required and cannot be empty.".to_string());
        }

        let ticket = self
            .helpdesk
            .get_ui_ticket(&Identifier::parse(&input.ticket_id))
            .await;
        Ok(render_json(&ticket))
    }

    /// Lists tickets. `null` when the host is unknown or the call failed.
    #[tool(description = "List GLPI tickets, optionally for a monitored 'host' or 'host/service' and a status. Returns null if the host is not linked to a GLPI asset or the request failed, [] if there are no tickets.")]
    async fn get_ui_tickets(&self, Parameters(input): Parameters<GetTicketsInput>) -> String {
        let input = input.sanitize();
        tracing::debug!(?input, "get_ui_tickets tool called");

        let tickets = self
            .helpdesk
            .get_ui_tickets(
                input.name.as_deref(),
                input.status.as_deref(),
                input.count(),
                input.list_only(),
            )
            .await;
        render_json(&tickets)
    }

    #[tool(description = "Create a GLPI ticket. Fields are forwarded as-is; session and source are added by the server. Returns the created ticket or null.")]
    async fn set_ui_ticket(&self, Parameters(input): Parameters<SubmissionInput>) -> String {
        tracing::debug!("set_ui_ticket tool called");
        let created = self.helpdesk.set_ui_ticket(input.parameters).await;
        self.render_created(created)
    }

    #[tool(description = "Add a follow-up to a GLPI ticket ('ticket' and 'content' fields). Session and source are added by the server. Returns the created follow-up or null.")]
    async fn set_ui_ticket_followup(
        &self,
        Parameters(input): Parameters<SubmissionInput>,
    ) -> String {
        tracing::debug!("set_ui_ticket_followup tool called");
        let created = self.helpdesk.set_ui_ticket_followup(input.parameters).await;
        render_json(&created)
    }

    #[tool(description = "Get the link to the GLPI web interface.")]
    fn get_external_ui_link(&self) -> String {
        self.helpdesk.get_external_ui_link()
    }

    /// Adds the web link of a created ticket to the rendered result.
    fn render_created(&self, created: Option<serde_json::Value>) -> String {
        let Some(mut ticket) = created else {
            return render_json(&None::<()>);
        };
        let link = ticket
            .get("id")
            .and_then(Identifier::from_value)
            .map(|id| self.helpdesk.ticket_link(&id));
        if let (Some(link), Some(map)) = (link, ticket.as_object_mut()) {
            map.insert("link".to_string(), serde_json::Value::String(link));
        }
        render_json(&ticket)
    }
}

#[tool_handler]
impl ServerHandler for HelpdeskServer {
    /// Returns server information for the MCP initialize handshake.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "GLPI helpdesk bridge for the monitoring broker. \
                 The broker delivers events with manage_brok. \
                 Use get_ui_tickets to list tickets of a host, get_ui_ticket for details, \
                 set_ui_ticket and set_ui_ticket_followup to create tickets and follow-ups. \
                 Start with 'ping' to verify connectivity."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Renders a tool result as pretty JSON; `None` becomes `null`.
fn render_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "cannot render tool result");
        "null".to_string()
    })
}
