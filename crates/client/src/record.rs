//! Loosely-typed resource row.

use console_core::{Entity, ItemId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One listed resource as returned by a `describe*` endpoint.
///
/// Only the identifier is typed; every other field is kept as raw JSON so a
/// single type serves all resource kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "id", alias = "Id", alias = "UserId", alias = "UserGroupId")]
    pub id: ItemId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Best human-readable name for log lines.
    pub fn display_name(&self) -> &str {
        ["Name", "DisplayName", "Hostname", "name"]
            .iter()
            .find_map(|key| self.fields.get(*key).and_then(Value::as_str))
            .unwrap_or_else(|| self.id.as_str())
    }
}

impl Entity for Record {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}
