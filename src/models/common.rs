//! Common types shared across the GLPI models.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A GLPI object identifier.
///
/// Monitoring custom variables carry identifiers as strings while the web
/// service usually answers with numbers, so both shapes are accepted and
/// passed back out unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// Numeric identifier, kept exactly as received.
    Number(Number),
    /// Identifier carried as text.
    Text(String),
}

impl Identifier {
    /// Parses user input.
    ///
    /// Only canonical integers (`12`, not `012` or `+12`) become numbers;
    /// anything else is passed on as the trimmed text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Identifier::Number(n.into()),
            _ => Identifier::Text(raw.to_string()),
        }
    }

    /// Extracts an identifier from a JSON scalar. Other shapes yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Identifier::Number(n.clone())),
            Value::String(s) => Some(Identifier::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Number(n.into())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{}", n),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

/// Opaque session token returned by `doLogin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(String);

impl Session {
    /// Wraps a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Session(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response of `doLogin`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// The new session token.
    pub session: Session,
}

/// Helpdesk configuration fetched once at startup.
///
/// The content is opaque to this module; only the `session` key is added so
/// front-end consumers can reuse the token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HelpdeskConfiguration(Map<String, Value>);

impl HelpdeskConfiguration {
    /// Wraps the raw configuration and attaches the session token.
    ///
    /// A non-object answer is kept under a `configuration` key.
    pub fn new(raw: Value, session: &Session) -> Self {
        let mut map = match raw {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("configuration".to_string(), other);
                map
            }
        };
        map.insert(
            "session".to_string(),
            Value::String(session.as_str().to_string()),
        );
        HelpdeskConfiguration(map)
    }

    /// Looks up a configuration key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
