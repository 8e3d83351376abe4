//! Client for the GLPI webservices plugin.
//!
//! Each remote procedure is one XML-RPC `<methodCall>` POSTed to the
//! configured endpoint (`.../plugins/webservices/xmlrpc.php`) with the
//! parameter mapping as its single `<struct>` argument. A `<fault>` answer
//! is a fault declared by the web service.
//!
//! Calls are never retried.
//!
//! # Security
//!
//! The login password is never logged. `doLogin` parameters are not traced.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::HelpdeskError;
use crate::models::procedures::DO_LOGIN;
use crate::models::{LoginParams, LoginResponse, Session};
use crate::xmlrpc;

/// Maximum length for HTTP error response bodies kept in errors.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Path segment where GLPI plugin endpoints start.
const PLUGINS_SEGMENT: &str = "/plugins/";

/// Channel to the GLPI web service.
///
/// Opening the channel does not contact the server; the first call does.
#[derive(Clone)]
pub struct GlpiClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// Web service endpoint.
    uri: String,

    /// Per-call timeout, reported in timeout errors.
    timeout: Duration,
}

impl GlpiClient {
    /// Opens a channel to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `HelpdeskError::HttpClient` if the HTTP client fails to initialize.
    pub fn connect(config: &Config) -> Result<Self, HelpdeskError> {
        tracing::info!(uri = %config.uri, "Connecting to GLPI web service");

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("glpi-helpdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HelpdeskError::HttpClient)?;

        tracing::info!("Connection opened");

        Ok(Self {
            http,
            uri: config.uri.clone(),
            timeout: config.timeout,
        })
    }

    /// Opens a session with the given credentials.
    ///
    /// # Errors
    ///
    /// A fault declared by `doLogin` becomes `HelpdeskError::Authentication`;
    /// transport errors are returned as-is.
    pub async fn login(
        &self,
        login_name: &str,
        login_password: &str,
    ) -> Result<Session, HelpdeskError> {
        tracing::info!(login_name = %login_name, "Authentication in progress...");

        let params = LoginParams {
            login_name,
            login_password,
        };

        let response: LoginResponse = self
            .call(DO_LOGIN, &params)
            .await
            .map_err(|e| match e {
                HelpdeskError::Fault { code, message } => {
                    HelpdeskError::Authentication { code, message }
                }
                other => other,
            })?;

        tracing::info!(session = %response.session, "Authenticated");
        Ok(response.session)
    }

    /// Invokes a remote procedure and decodes its result.
    ///
    /// The caller is responsible for putting the session in `params`.
    ///
    /// # Errors
    ///
    /// Returns `HelpdeskError::Fault` when the web service declares a fault,
    /// and transport, status, or decoding errors otherwise.
    pub async fn call<P, T>(&self, procedure: &str, params: &P) -> Result<T, HelpdeskError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let params = serde_json::to_value(params)?;
        if !params.is_object() {
            return Err(HelpdeskError::protocol(
                "remote procedure parameters must be a mapping",
            ));
        }
        let request = xmlrpc::encode_call(procedure, &params);

        tracing::debug!(procedure = %procedure, "Calling GLPI web service");

        let response = self
            .http
            .post(&self.uri)
            .header(CONTENT_TYPE, "text/xml")
            .body(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    return HelpdeskError::Timeout {
                        duration: self.timeout,
                        operation: procedure.to_string(),
                    };
                }
                HelpdeskError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = if body.len() > MAX_ERROR_BODY_LEN {
                let mut end = MAX_ERROR_BODY_LEN;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...[truncated]", &body[..end])
            } else {
                body
            };
            return Err(HelpdeskError::HttpStatus { status, body });
        }

        let body = response.text().await.map_err(HelpdeskError::Http)?;

        tracing::trace!(procedure = %procedure, body = %body, "GLPI web service response");

        let value = xmlrpc::decode_response(&body)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Link to the GLPI web interface, derived from the endpoint URI.
    ///
    /// `http://host/glpi/plugins/webservices/xmlrpc.php` gives `http://host/glpi`.
    pub fn external_link(&self) -> String {
        let base = match self.uri.find(PLUGINS_SEGMENT) {
            Some(pos) => &self.uri[..pos],
            None => self.uri.as_str(),
        };
        base.trim_end_matches('/').to_string()
    }

    /// Link to a ticket form in the GLPI web interface.
    pub fn ticket_link(&self, ticket_id: &str) -> String {
        format!(
            "{}/front/ticket.form.php?id={}",
            self.external_link(),
            urlencoding::encode(ticket_id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_client(uri: &str) -> GlpiClient {
        let config = Config {
            uri: uri.to_string(),
            ..Config::default()
        };
        GlpiClient::connect(&config).unwrap()
    }

    #[tokio::test]
    async fn test_call_rejects_non_mapping_parameters() {
        let client = test_client("http://127.0.0.1:9/glpi/plugins/webservices/xmlrpc.php");
        let result: Result<serde_json::Value, _> =
            client.call("glpi.listTickets", &json!([1, 2])).await;
        assert!(matches!(result, Err(HelpdeskError::Protocol(_))));
    }

    #[test]
    fn test_external_link_trims_plugin_path() {
        let client = test_client("http://localhost/glpi/plugins/webservices/xmlrpc.php");
        assert_eq!(client.external_link(), "http://localhost/glpi");
    }

    #[test]
    fn test_external_link_without_plugin_path() {
        let client = test_client("https://helpdesk.example.com");
        assert_eq!(client.external_link(), "https://helpdesk.example.com");
    }

    #[test]
    fn test_ticket_link_encodes_id() {
        let client = test_client("http://localhost/glpi/plugins/webservices/xmlrpc.php");
        assert_eq!(
            client.ticket_link("12"),
            "http://localhost/glpi/front/ticket.form.php?id=12"
        );
        let link = client.ticket_link("12&evil=1");
        assert!(link.ends_with("id=12%26evil%3D1"));
    }
}
