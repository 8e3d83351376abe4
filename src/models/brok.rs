//! Broks: tagged event records streamed by the monitoring broker.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Brok type carrying a host's state at broker start-up.
pub const INITIAL_HOST_STATUS: &str = "initial_host_status";
/// Brok type emitted when a host downtime is scheduled.
pub const SCHEDULE_HOST_DOWNTIME: &str = "schedule_host_downtime";
/// Brok type emitted when a service downtime is scheduled.
pub const SCHEDULE_SERVICE_DOWNTIME: &str = "schedule_service_downtime";

/// A raw brok as delivered by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brok {
    /// Event type tag.
    #[serde(rename = "type")]
    pub kind: String,

    /// Type-dependent payload.
    #[serde(default)]
    pub data: Value,
}

impl Brok {
    /// Creates a brok from its parts.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Decodes the payload according to the type tag.
    ///
    /// Unknown types decode to [`BrokEvent::Ignored`].
    ///
    /// # Errors
    ///
    /// Returns the decoding error when a recognised type carries a payload
    /// without its required fields.
    pub fn event(&self) -> Result<BrokEvent, serde_json::Error> {
        let event = match self.kind.as_str() {
            INITIAL_HOST_STATUS => {
                BrokEvent::InitialHostStatus(InitialHostStatus::deserialize(&self.data)?)
            }
            SCHEDULE_HOST_DOWNTIME => {
                BrokEvent::HostDowntime(HostDowntime::deserialize(&self.data)?)
            }
            SCHEDULE_SERVICE_DOWNTIME => {
                BrokEvent::ServiceDowntime(ServiceDowntime::deserialize(&self.data)?)
            }
            _ => BrokEvent::Ignored,
        };
        Ok(event)
    }
}

/// A decoded brok.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokEvent {
    /// Initial host status.
    InitialHostStatus(InitialHostStatus),
    /// Host downtime scheduled.
    HostDowntime(HostDowntime),
    /// Service downtime scheduled.
    ServiceDowntime(ServiceDowntime),
    /// Any other brok type.
    Ignored,
}

/// Payload of `initial_host_status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InitialHostStatus {
    /// Monitored host name.
    pub host_name: String,

    /// Host custom variables.
    #[serde(default, deserialize_with = "customs_or_empty")]
    pub customs: Map<String, Value>,
}

/// Payload of `schedule_host_downtime`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostDowntime {
    /// Monitored host name.
    pub host_name: String,
}

/// Payload of `schedule_service_downtime`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceDowntime {
    /// Monitored host name.
    pub host_name: String,
    /// Service description on that host.
    pub service_description: String,
}

// A null or non-object `customs` means no custom variables.
fn customs_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}
