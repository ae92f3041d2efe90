//! Closed set of resource kinds the console lists.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;

/// Resource collection behind a list page or picker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Sessions,
    Servers,
    Users,
    UserGroups,
    SessionTemplates,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Sessions,
        ResourceKind::Servers,
        ResourceKind::Users,
        ResourceKind::UserGroups,
        ResourceKind::SessionTemplates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Sessions => "sessions",
            ResourceKind::Servers => "servers",
            ResourceKind::Users => "users",
            ResourceKind::UserGroups => "user_groups",
            ResourceKind::SessionTemplates => "session_templates",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConsoleError::config(format!("unknown resource kind `{s}`")))
    }
}
