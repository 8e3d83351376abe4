//! Event-driven host cache and helpdesk operations.
//!
//! `Helpdesk` owns the session and the host cache. Broks fill the cache,
//! the query and mutation operations translate local parameters into one
//! remote call each. Runtime failures are logged and become `None`; only
//! [`Helpdesk::init`] returns an error.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::HelpdeskError;
use crate::glpi_client::GlpiClient;
use crate::models::procedures::{
    ADD_TICKET_FOLLOWUP, CREATE_TICKET, GET_HELPDESK_CONFIGURATION, GET_TICKET, LIST_TICKETS,
};
use crate::models::{
    Brok, BrokEvent, GetTicketParams, HelpdeskConfiguration, HostCacheEntry, HostDowntime,
    Identifier, InitialHostStatus, ListTicketsParams, ServiceDowntime, Session, SessionParams,
    Submission,
};

/// Helpdesk module state: session, configuration and host cache.
pub struct Helpdesk {
    client: GlpiClient,
    session: Session,
    configuration: HelpdeskConfiguration,
    source: String,
    hosts: RwLock<HashMap<String, HostCacheEntry>>,
}

impl Helpdesk {
    /// Runs the startup sequence: connect, log in, fetch the helpdesk configuration.
    ///
    /// # Errors
    ///
    /// Every failure is fatal and returned as `HelpdeskError::Initialization`.
    pub async fn init(config: &Config) -> Result<Self, HelpdeskError> {
        let password = config.login_password.as_str();

        let client = GlpiClient::connect(config).map_err(|e| {
            HelpdeskError::initialization(format!(
                "cannot open channel to {}: {}",
                config.uri,
                e.sanitized_display(password)
            ))
        })?;

        let session = client
            .login(&config.login_name, password)
            .await
            .map_err(|e| {
                let sanitized = e.sanitized_display(password);
                tracing::error!(error = %sanitized, "Authentication refused");
                HelpdeskError::initialization(sanitized)
            })?;

        let raw: Value = client
            .call(GET_HELPDESK_CONFIGURATION, &SessionParams::new(&session))
            .await
            .map_err(|e| {
                let sanitized = e.sanitized_display(password);
                tracing::error!(error = %sanitized, "Cannot fetch helpdesk configuration");
                HelpdeskError::initialization(format!(
                    "helpdesk configuration unavailable: {}",
                    sanitized
                ))
            })?;

        let configuration = HelpdeskConfiguration::new(raw, &session);
        tracing::info!(?configuration, "Helpdesk configuration loaded");

        Ok(Self::from_parts(
            client,
            session,
            configuration,
            config.source.clone(),
        ))
    }

    /// Assembles a helpdesk from an already authenticated channel.
    pub fn from_parts(
        client: GlpiClient,
        session: Session,
        configuration: HelpdeskConfiguration,
        source: String,
    ) -> Self {
        Self {
            client,
            session,
            configuration,
            source,
            hosts: RwLock::new(HashMap::new()),
        }
    }

    // ========================================================================
    // Brok handling
    // ========================================================================

    /// Handles one brok from the broker.
    ///
    /// Unknown types are ignored and malformed payloads are logged; nothing
    /// is ever returned to the broker.
    pub async fn manage_brok(&self, brok: &Brok) {
        let event = match brok.event() {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(brok_type = %brok.kind, error = %e, "Malformed brok ignored");
                return;
            }
        };

        match event {
            BrokEvent::InitialHostStatus(status) => self.initial_host_status(status).await,
            BrokEvent::HostDowntime(downtime) => self.host_downtime(downtime).await,
            BrokEvent::ServiceDowntime(downtime) => Self::service_downtime(&downtime),
            BrokEvent::Ignored => {
                tracing::trace!(brok_type = %brok.kind, "Brok ignored");
            }
        }
    }

    async fn initial_host_status(&self, status: InitialHostStatus) {
        tracing::debug!(host = %status.host_name, customs = ?status.customs, "initial host status");

        let entry = HostCacheEntry::from_customs(&status.customs);
        match &entry {
            HostCacheEntry::Resolved(asset) => {
                tracing::info!(host = %status.host_name, ?asset, "Host resolved to GLPI asset");
            }
            HostCacheEntry::Unresolved => {
                tracing::warn!(
                    host = %status.host_name,
                    "no custom _HOSTID and/or _ITEMTYPE and/or _ITEMSID and/or _ENTITIESID"
                );
            }
        }

        self.hosts.write().await.insert(status.host_name, entry);
    }

    async fn host_downtime(&self, downtime: HostDowntime) {
        tracing::warn!(host = %downtime.host_name, "received brok for host downtime");

        let resolved = matches!(
            self.host_entry(&downtime.host_name).await,
            Some(HostCacheEntry::Resolved(_))
        );
        if resolved {
            let start = Instant::now();
            tracing::debug!(
                host = %downtime.host_name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "host downtime scheduled"
            );
        }
    }

    fn service_downtime(downtime: &ServiceDowntime) {
        tracing::warn!(
            host = %downtime.host_name,
            service = %downtime.service_description,
            "received brok for service downtime"
        );
    }

    /// Snapshot of a host's cache slot.
    pub async fn host_entry(&self, host_name: &str) -> Option<HostCacheEntry> {
        self.hosts.read().await.get(host_name).cloned()
    }

    // ========================================================================
    // Ticket queries
    // ========================================================================

    /// Fetches one ticket with names resolved.
    ///
    /// Returns `None` on any failure, including "not found".
    pub async fn get_ticket(&self, id: &Identifier) -> Option<Value> {
        let params = GetTicketParams::new(&self.session, id.clone());
        tracing::info!(ticket_id = %id, "getTicket");

        match self.client.call::<_, Value>(GET_TICKET, &params).await {
            Ok(ticket) => {
                tracing::debug!(ticket_id = %id, ?ticket, "getTicket result");
                Some(ticket)
            }
            Err(e) => {
                tracing::error!(ticket_id = %id, fault = e.is_fault(), error = %e, "error when fetching ticket");
                None
            }
        }
    }

    /// Lists tickets, optionally restricted to a host's asset and a status.
    ///
    /// Returns `None` when `host_name` is not a resolved cache entry or when
    /// the remote call fails; an empty list means the service found nothing.
    /// With `list_only` false each summary is replaced by the full ticket;
    /// tickets that fail to expand are skipped.
    pub async fn get_tickets(
        &self,
        host_name: Option<&str>,
        status: Option<&str>,
        count: u32,
        list_only: bool,
    ) -> Option<Vec<Value>> {
        let mut params = ListTicketsParams::new(&self.session, count);

        if let Some(host) = host_name {
            match self.host_entry(host).await {
                Some(HostCacheEntry::Resolved(asset)) => params = params.with_asset(&asset),
                _ => {
                    tracing::warn!(host = %host, "getTickets, host is not defined in GLPI");
                    return None;
                }
            }
        }

        if let Some(status) = status {
            params = params.with_status(status);
        }

        tracing::info!(?params, "listTickets");

        let records: Vec<Value> = match self.client.call(LIST_TICKETS, &params).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(fault = e.is_fault(), error = %e, "error when fetching tickets list");
                return None;
            }
        };

        tracing::debug!(count = records.len(), "listTickets result");

        if list_only {
            return Some(records);
        }

        let mut tickets = Vec::with_capacity(records.len());
        for record in &records {
            let Some(id) = record.get("id").and_then(Identifier::from_value) else {
                tracing::warn!(?record, "ticket summary without id skipped");
                continue;
            };
            if let Some(ticket) = self.get_ticket(&id).await {
                tickets.push(ticket);
            }
        }
        Some(tickets)
    }

    // ========================================================================
    // Ticket mutations
    // ========================================================================

    /// Creates a ticket from caller-supplied fields.
    pub async fn create_ticket(&self, parameters: Map<String, Value>) -> Option<Value> {
        self.submit(CREATE_TICKET, "ticket", parameters).await
    }

    /// Adds a follow-up to a ticket from caller-supplied fields.
    pub async fn create_ticket_followup(&self, parameters: Map<String, Value>) -> Option<Value> {
        self.submit(ADD_TICKET_FOLLOWUP, "ticket follow-up", parameters)
            .await
    }

    async fn submit(
        &self,
        procedure: &str,
        what: &str,
        parameters: Map<String, Value>,
    ) -> Option<Value> {
        tracing::info!(?parameters, "request to create a {}", what);

        let submission = Submission::new(parameters, &self.session, &self.source);
        match self.client.call::<_, Value>(procedure, &submission).await {
            Ok(created) => {
                tracing::info!(id = ?created.get("id"), "created a new {}", what);
                Some(created)
            }
            Err(e) => {
                tracing::error!(fault = e.is_fault(), error = %e, "error when creating a new {}", what);
                None
            }
        }
    }

    // ========================================================================
    // Front-end facade
    // ========================================================================

    /// Current session token.
    pub fn get_ui_session(&self) -> &Session {
        &self.session
    }

    /// Helpdesk configuration fetched at startup, session included.
    pub fn get_ui_helpdesk_configuration(&self) -> &HelpdeskConfiguration {
        &self.configuration
    }

    /// One ticket by id.
    pub async fn get_ui_ticket(&self, id: &Identifier) -> Option<Value> {
        self.get_ticket(id).await
    }

    /// Tickets for an element named `host` or `host/service`.
    ///
    /// Only the host part selects tickets.
    pub async fn get_ui_tickets(
        &self,
        name: Option<&str>,
        status: Option<&str>,
        count: u32,
        list_only: bool,
    ) -> Option<Vec<Value>> {
        let (host, service) = match name {
            Some(name) => match name.split_once('/') {
                Some((host, service)) => (Some(host), Some(service)),
                None => (Some(name), None),
            },
            None => (None, None),
        };
        tracing::debug!(?host, ?service, "get_ui_tickets");

        self.get_tickets(host, status, count, list_only).await
    }

    /// Creates a ticket for the front-end.
    pub async fn set_ui_ticket(&self, parameters: Map<String, Value>) -> Option<Value> {
        self.create_ticket(parameters).await
    }

    /// Adds a ticket follow-up for the front-end.
    pub async fn set_ui_ticket_followup(&self, parameters: Map<String, Value>) -> Option<Value> {
        self.create_ticket_followup(parameters).await
    }

    /// Link to the GLPI web interface.
    pub fn get_external_ui_link(&self) -> String {
        self.client.external_link()
    }

    /// Link to one ticket in the GLPI web interface.
    pub fn ticket_link(&self, id: &Identifier) -> String {
        self.client.ticket_link(&id.to_string())
    }
}
