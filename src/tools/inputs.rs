//! Tool input parameter structs.
//!
//! This module defines the input types for each tool, with JSON Schema
//! derivation for tool discovery.
//!
//! # Input Sanitization
//!
//! Input structs implement `sanitize()` which trims whitespace from
//! string fields. This should be called before processing input.

use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::{Brok, DEFAULT_TICKET_LIMIT};

/// Helper function to trim an optional string.
fn trim_option(s: &Option<String>) -> Option<String> {
    s.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Input parameters for the manage_brok tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ManageBrokInput {
    /// Brok type, e.g. "initial_host_status" or "schedule_host_downtime".
    #[serde(rename = "type")]
    pub brok_type: String,

    /// Brok payload; its shape depends on the type.
    #[serde(default)]
    pub data: Value,
}

impl ManageBrokInput {
    /// Converts the input into a brok.
    pub fn into_brok(self) -> Brok {
        Brok::new(self.brok_type.trim(), self.data)
    }
}

/// Input parameters for the get_ui_ticket tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTicketInput {
    /// GLPI ticket id.
    pub ticket_id: String,
}

impl GetTicketInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
        }
    }
}

/// Input parameters for the get_ui_tickets tool.
///
/// All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetTicketsInput {
    /// Monitored element: "host" or "host/service". Omit to list all tickets.
    #[serde(default)]
    pub name: Option<String>,

    /// Ticket status keyword or code (e.g. "notclosed", "new", "solved"), passed through to GLPI.
    #[serde(default)]
    pub status: Option<String>,

    /// Maximum number of tickets to return (default: 50).
    #[serde(default)]
    pub count: Option<u32>,

    /// If false, each ticket is fetched in full detail (default: true).
    #[serde(default)]
    pub list_only: Option<bool>,
}

impl GetTicketsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            name: trim_option(&self.name),
            status: trim_option(&self.status),
            count: self.count,
            list_only: self.list_only,
        }
    }

    /// Requested count, or the default.
    pub fn count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_TICKET_LIMIT)
    }

    /// Requested list mode, or the default.
    pub fn list_only(&self) -> bool {
        self.list_only.unwrap_or(true)
    }
}

/// Input parameters for the set_ui_ticket and set_ui_ticket_followup tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SubmissionInput {
    /// Fields forwarded to GLPI as-is (e.g. "title", "content", "ticket").
    /// "session" and "source" are always set by the server.
    pub parameters: Map<String, Value>,
}
