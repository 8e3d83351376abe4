//! Host cache entries.
//!
//! A monitored host maps to a GLPI asset through four custom variables set
//! on the host definition.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::Identifier;

/// Custom variable holding the GLPI host id.
pub const CUSTOM_HOST_ID: &str = "_HOSTID";
/// Custom variable holding the asset item type (e.g. `Computer`).
pub const CUSTOM_ITEM_TYPE: &str = "_ITEMTYPE";
/// Custom variable holding the asset item id.
pub const CUSTOM_ITEMS_ID: &str = "_ITEMSID";
/// Custom variable holding the asset entity id.
pub const CUSTOM_ENTITIES_ID: &str = "_ENTITIESID";

/// The GLPI asset a host is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// GLPI host id.
    #[serde(rename = "hostsid")]
    pub hosts_id: Identifier,
    /// Asset type, e.g. `Computer` or `NetworkEquipment`.
    pub itemtype: String,
    /// Asset id within its type.
    pub items_id: Identifier,
    /// Entity owning the asset.
    pub entities_id: Identifier,
}

impl Asset {
    /// Builds an asset from a host's custom variables.
    ///
    /// All four variables must be present and scalar; anything else yields `None`.
    pub fn from_customs(customs: &Map<String, Value>) -> Option<Self> {
        let hosts_id = customs.get(CUSTOM_HOST_ID).and_then(Identifier::from_value)?;
        let itemtype = customs
            .get(CUSTOM_ITEM_TYPE)
            .and_then(Identifier::from_value)?
            .to_string();
        let items_id = customs.get(CUSTOM_ITEMS_ID).and_then(Identifier::from_value)?;
        let entities_id = customs
            .get(CUSTOM_ENTITIES_ID)
            .and_then(Identifier::from_value)?;

        Some(Asset {
            hosts_id,
            itemtype,
            items_id,
            entities_id,
        })
    }
}

/// One slot of the host cache.
///
/// A host whose custom variables are incomplete still gets a slot, marked
/// unresolved, until a later initial status overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCacheEntry {
    /// The host maps to a GLPI asset.
    Resolved(Asset),
    /// The host lacks one or more of the identifying custom variables.
    Unresolved,
}

impl HostCacheEntry {
    /// Builds the entry for a host's custom variables.
    pub fn from_customs(customs: &Map<String, Value>) -> Self {
        match Asset::from_customs(customs) {
            Some(asset) => HostCacheEntry::Resolved(asset),
            None => HostCacheEntry::Unresolved,
        }
    }

    /// The asset id, `None` when unresolved.
    pub fn asset_id(&self) -> Option<&Identifier> {
        self.asset().map(|a| &a.items_id)
    }

    /// The asset, `None` when unresolved.
    pub fn asset(&self) -> Option<&Asset> {
        match self {
            HostCacheEntry::Resolved(asset) => Some(asset),
            HostCacheEntry::Unresolved => None,
        }
    }
}

// Unresolved entries render as `{"items_id": null}` for front-end consumers.
impl Serialize for HostCacheEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            HostCacheEntry::Resolved(asset) => asset.serialize(serializer),
            HostCacheEntry::Unresolved => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("items_id", &Option::<Identifier>::None)?;
                map.end()
            }
        }
    }
}
