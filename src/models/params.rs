//! Parameter schemas for the GLPI web service procedures.
//!
//! Every procedure except `doLogin` carries the session token.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{Asset, Identifier, Session};

/// Procedure names as exposed by the webservices plugin.
pub mod procedures {
    /// Opens a session.
    pub const DO_LOGIN: &str = "glpi.doLogin";
    /// Fetches the helpdesk (kiosk) configuration.
    pub const GET_HELPDESK_CONFIGURATION: &str = "kiosks.getHelpdeskConfiguration";
    /// Lists ticket summaries.
    pub const LIST_TICKETS: &str = "glpi.listTickets";
    /// Fetches one ticket.
    pub const GET_TICKET: &str = "glpi.getTicket";
    /// Creates a ticket.
    pub const CREATE_TICKET: &str = "glpi.createTicket";
    /// Adds a follow-up to a ticket.
    pub const ADD_TICKET_FOLLOWUP: &str = "glpi.addTicketFollowup";
}

/// Default number of tickets requested by `listTickets`.
pub const DEFAULT_TICKET_LIMIT: u32 = 50;

/// Parameters of `doLogin`.
#[derive(Serialize)]
pub struct LoginParams<'a> {
    /// Account name.
    pub login_name: &'a str,
    /// Account password. Never logged.
    pub login_password: &'a str,
}

/// Parameters of procedures that only need the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionParams {
    /// Session token.
    pub session: Session,
}

impl SessionParams {
    /// Parameters carrying only `session`.
    pub fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
        }
    }
}

/// Parameters of `listTickets`.
#[derive(Debug, Clone, Serialize)]
pub struct ListTicketsParams {
    /// Session token.
    pub session: Session,
    /// Resolve ids to names (`1`).
    pub id2name: u8,
    /// Answer in ISO-8859-1 (`1`).
    pub iso8859: u8,
    /// Maximum number of tickets.
    pub limit: u32,

    /// Entity of the asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Identifier>,

    /// Asset type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itemtype: Option<String>,

    /// Asset id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Identifier>,

    /// Free-form status keyword or code, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ListTicketsParams {
    /// Lists up to `limit` tickets with names resolved.
    pub fn new(session: &Session, limit: u32) -> Self {
        Self {
            session: session.clone(),
            id2name: 1,
            iso8859: 1,
            limit,
            entity: None,
            itemtype: None,
            item: None,
            status: None,
        }
    }

    /// Restricts the list to tickets attached to `asset`.
    pub fn with_asset(mut self, asset: &Asset) -> Self {
        self.entity = Some(asset.entities_id.clone());
        self.itemtype = Some(asset.itemtype.clone());
        self.item = Some(asset.items_id.clone());
        self
    }

    /// Filters by status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Parameters of `getTicket`.
#[derive(Debug, Clone, Serialize)]
pub struct GetTicketParams {
    /// Session token.
    pub session: Session,
    /// Ticket id.
    pub ticket: Identifier,
    /// Resolve ids to names (`1`).
    pub id2name: u8,
    /// Answer in ISO-8859-1 (`1`).
    pub iso8859: u8,
}

impl GetTicketParams {
    /// Fetches `ticket` with names resolved.
    pub fn new(session: &Session, ticket: Identifier) -> Self {
        Self {
            session: session.clone(),
            ticket,
            id2name: 1,
            iso8859: 1,
        }
    }
}

/// Caller-supplied parameters of `createTicket` / `addTicketFollowup`.
///
/// The content is not validated here; `session` and `source` are injected
/// and replace any value the caller supplied for those keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Submission(Map<String, Value>);

impl Submission {
    /// Injects `session` and `source` into the caller's fields.
    pub fn new(mut fields: Map<String, Value>, session: &Session, source: &str) -> Self {
        fields.insert(
            "session".to_string(),
            Value::String(session.as_str().to_string()),
        );
        fields.insert("source".to_string(), Value::String(source.to_string()));
        Submission(fields)
    }

    /// The final field set sent to the web service.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}
