//! Configuration management for the GLPI helpdesk module.
//!
//! Every option has a default so the module starts against a local GLPI
//! install out of the box. Values are read from environment variables
//! (a `.env` file is honoured by the binary).

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::HelpdeskError;

/// Default web service endpoint.
pub const DEFAULT_URI: &str = "http://localhost/glpi/plugins/webservices/xmlrpc.php";

/// Default login name.
pub const DEFAULT_LOGIN_NAME: &str = "shinken";

/// Default login password.
pub const DEFAULT_LOGIN_PASSWORD: &str = "shinken";

/// Default provenance tag attached to created tickets and follow-ups.
pub const DEFAULT_SOURCE: &str = "Shinken";

/// Default transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the GLPI web service.
///
/// The password is stored but never logged or exposed in error messages.
#[derive(Clone)]
pub struct Config {
    /// Web service endpoint URL.
    pub uri: String,

    /// Account used for `doLogin`.
    pub login_name: String,

    /// Password used for `doLogin`.
    /// This value must never be logged or included in error messages.
    pub login_password: String,

    /// Ticket provenance tag.
    pub source: String,

    /// Per-call transport timeout.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            login_name: DEFAULT_LOGIN_NAME.to_string(),
            login_password: DEFAULT_LOGIN_PASSWORD.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("uri", &self.uri)
            .field("login_name", &self.login_name)
            .field("login_password", &"[REDACTED]")
            .field("source", &self.source)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Recognised Environment Variables
    ///
    /// - `GLPI_URI`: web service endpoint (default [`DEFAULT_URI`])
    /// - `GLPI_LOGIN_NAME`: login account (default [`DEFAULT_LOGIN_NAME`])
    /// - `GLPI_LOGIN_PASSWORD`: login password (default [`DEFAULT_LOGIN_PASSWORD`])
    /// - `GLPI_SOURCE`: ticket provenance tag (default [`DEFAULT_SOURCE`])
    /// - `GLPI_TIMEOUT_SECS`: transport timeout (default [`DEFAULT_TIMEOUT_SECS`])
    ///
    /// # Errors
    ///
    /// Returns `HelpdeskError::Config` if a value fails validation.
    pub fn from_env() -> Result<Self, HelpdeskError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, HelpdeskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = lookup("GLPI_URI")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URI.to_string());
        let uri = Self::validate_uri(uri)?;

        let login_name = match lookup("GLPI_LOGIN_NAME") {
            Some(name) if name.trim().is_empty() => {
                return Err(HelpdeskError::invalid_config(
                    "GLPI_LOGIN_NAME must not be empty",
                ))
            }
            Some(name) => name.trim().to_string(),
            None => DEFAULT_LOGIN_NAME.to_string(),
        };

        let login_password = lookup("GLPI_LOGIN_PASSWORD")
            .unwrap_or_else(|| DEFAULT_LOGIN_PASSWORD.to_string());

        let source = lookup("GLPI_SOURCE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        let timeout = match lookup("GLPI_TIMEOUT_SECS") {
            Some(raw) => Self::parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config {
            uri,
            login_name,
            login_password,
            source,
            timeout,
        })
    }

    /// Validates and normalizes the endpoint URI.
    fn validate_uri(uri: String) -> Result<String, HelpdeskError> {
        let uri = uri.trim().trim_end_matches('/').to_string();

        let parsed = Url::parse(&uri)
            .map_err(|e| HelpdeskError::invalid_config(format!("GLPI_URI is not a URL: {}", e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(HelpdeskError::invalid_config(
                "GLPI_URI must start with http:// or https://",
            ));
        }

        Ok(uri)
    }

    fn parse_timeout(raw: &str) -> Result<Duration, HelpdeskError> {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(HelpdeskError::invalid_config(
                "GLPI_TIMEOUT_SECS must be a positive number of seconds",
            )),
        }
    }
}
