//! Filter token translation.
//!
//! The UI speaks in property keys ("Hostnames", "DisplayNames"); the backend
//! speaks in field paths ("Server.Hostname", "DisplayName"). Each resource kind
//! owns one table. A key missing from the table is a programmer error and is
//! rejected before anything reaches the network layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use console_core::{ConsoleError, ConsoleResult, ResourceKind};
use serde::{Deserialize, Serialize};

use crate::query::{Operation, Query};

/// Comparison applied by a single token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ":")]
    Contains,
    #[serde(rename = "!:")]
    NotContains,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
}

impl FilterOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "=",
            FilterOperator::NotEqual => "!=",
            FilterOperator::Contains => ":",
            FilterOperator::NotContains => "!:",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
        }
    }
}

/// One UI filter chip, e.g. `Hostnames : web`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterToken {
    pub property_key: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterToken {
    pub fn new(
        property_key: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            property_key: property_key.into(),
            operator,
            value: value.into(),
        }
    }
}

/// One row of a translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// UI property key.
    pub key: &'static str,
    /// Backend field path.
    pub field: &'static str,
    /// Display name of the property.
    pub label: &'static str,
    /// Display name of the property's value group in the filter dropdown.
    pub group_label: &'static str,
}

const fn field(
    key: &'static str,
    field: &'static str,
    label: &'static str,
    group_label: &'static str,
) -> FieldMapping {
    FieldMapping {
        key,
        field,
        label,
        group_label,
    }
}

const SESSION_FIELDS: &[FieldMapping] = &[
    field("Names", "Name", "Name", "Name values"),
    field("Ids", "Id", "ID", "ID values"),
    field("Owners", "Owner", "Owner", "Owner values"),
    field("States", "State", "State", "State values"),
    field("Types", "Type", "Type", "Type values"),
    field("Hostnames", "Server.Hostname", "Hostname", "Hostname values"),
    field("IpAddresses", "Server.Ip", "IP address", "IP address values"),
    field("OsFamilies", "Server.Host.Os.Family", "OS", "OS values"),
    field("NumOfConnections", "NumOfConnections", "Connections", "Connection counts"),
    field("CreationTimes", "CreationTime", "Created", "Creation times"),
    field(
        "LastDisconnectionTimes",
        "LastDisconnectionTime",
        "Last disconnected",
        "Last disconnection times",
    ),
];

const SERVER_FIELDS: &[FieldMapping] = &[
    field("Ids", "Id", "ID", "ID values"),
    field("Hostnames", "Hostname", "Hostname", "Hostname values"),
    field("Ips", "Ip", "IP address", "IP address values"),
    field("Availabilities", "Availability", "Availability", "Availability values"),
    field(
        "UnavailabilityReasons",
        "UnavailabilityReason",
        "Unavailability reason",
        "Unavailability reasons",
    ),
    field("OsFamilies", "Host.Os.Family", "OS family", "OS family values"),
    field("OsNames", "Host.Os.Name", "OS name", "OS name values"),
    field("Versions", "Version", "Version", "Version values"),
];

const USER_FIELDS: &[FieldMapping] = &[
    field("UserIds", "UserId", "User ID", "User ID values"),
    field("DisplayNames", "DisplayName", "Display name", "Display name values"),
    field("Roles", "Role", "Role", "Role values"),
    field("IsDisabled", "IsDisabled", "Disabled", "Disabled values"),
    field("DisabledReasons", "DisabledReason", "Disabled reason", "Disabled reasons"),
    field("IsImported", "IsImported", "Imported", "Imported values"),
    field("CreationTimes", "CreationTime", "Created", "Creation times"),
    field("LastModifiedTimes", "LastModifiedTime", "Last modified", "Last modified times"),
    field("LastLoggedInTimes", "LastLoggedInTime", "Last logged in", "Last login times"),
];

const USER_GROUP_FIELDS: &[FieldMapping] = &[
    field("UserGroupIds", "UserGroupId", "Group ID", "Group ID values"),
    field("DisplayNames", "DisplayName", "Display name", "Display name values"),
    field("UserIds", "UserIds", "Member", "Member values"),
    field("IsImported", "IsImported", "Imported", "Imported values"),
    field("CreationTimes", "CreationTime", "Created", "Creation times"),
    field("LastModifiedTimes", "LastModifiedTime", "Last modified", "Last modified times"),
];

const SESSION_TEMPLATE_FIELDS: &[FieldMapping] = &[
    field("Ids", "Id", "ID", "ID values"),
    field("Names", "Name", "Name", "Name values"),
    field("Descriptions", "Description", "Description", "Description values"),
    field("OsFamilies", "OsFamily", "OS", "OS values"),
    field("OsVersions", "OsVersions", "OS version", "OS version values"),
    field("InstanceIds", "InstanceIds", "Instance ID", "Instance ID values"),
    field("InstanceTypes", "InstanceTypes", "Instance type", "Instance type values"),
    field("Types", "Type", "Session type", "Session type values"),
    field("CreatedBy", "CreatedBy", "Created by", "Creator values"),
    field("CreationTimes", "CreationTime", "Created", "Creation times"),
    field("LastModifiedBy", "LastModifiedBy", "Last modified by", "Modifier values"),
    field("LastModifiedTimes", "LastModifiedTime", "Last modified", "Last modified times"),
];

fn builtin_fields(kind: ResourceKind) -> &'static [FieldMapping] {
    match kind {
        ResourceKind::Sessions => SESSION_FIELDS,
        ResourceKind::Servers => SERVER_FIELDS,
        ResourceKind::Users => USER_FIELDS,
        ResourceKind::UserGroups => USER_GROUP_FIELDS,
        ResourceKind::SessionTemplates => SESSION_TEMPLATE_FIELDS,
    }
}

/// A single OR'ed condition inside a field group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub operator: FilterOperator,
    pub value: String,
}

/// All conditions on one backend field; conditions are OR'ed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroup {
    pub field: String,
    pub conditions: Vec<Condition>,
}

/// Query in backend terms, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendQuery {
    pub groups: Vec<FieldGroup>,
    pub operation: Operation,
}

impl BackendQuery {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Property key table for one resource kind.
#[derive(Debug, Clone)]
pub struct FilterTranslator {
    kind: ResourceKind,
    fields: Vec<FieldMapping>,
}

impl FilterTranslator {
    /// Translator with a caller-supplied table.
    pub fn new(kind: ResourceKind, fields: Vec<FieldMapping>) -> Self {
        Self { kind, fields }
    }

    /// Translator with the console's built-in table for `kind`.
    pub fn for_kind(kind: ResourceKind) -> Self {
        Self::new(kind, builtin_fields(kind).to_vec())
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Table rows in declaration order.
    pub fn properties(&self) -> &[FieldMapping] {
        &self.fields
    }

    fn lookup(&self, ui_key: &str) -> ConsoleResult<&FieldMapping> {
        self.fields
            .iter()
            .find(|m| m.key == ui_key)
            .ok_or_else(|| ConsoleError::unknown_filter_key(self.kind, ui_key))
    }

    pub fn translate(&self, ui_key: &str) -> ConsoleResult<&'static str> {
        self.lookup(ui_key).map(|m| m.field)
    }

    pub fn label(&self, ui_key: &str) -> ConsoleResult<&'static str> {
        self.lookup(ui_key).map(|m| m.label)
    }

    pub fn group_label(&self, ui_key: &str) -> ConsoleResult<&'static str> {
        self.lookup(ui_key).map(|m| m.group_label)
    }

    /// Translate every token, OR-ing tokens that share a property key.
    ///
    /// Groups keep the order in which their key first appears. Fails on the
    /// first unknown key.
    pub fn translate_query(&self, query: &Query) -> ConsoleResult<BackendQuery> {
        let mut groups: Vec<(&str, FieldGroup)> = Vec::new();

        for token in query.tokens() {
            let field = self.translate(&token.property_key)?;
            let condition = Condition {
                operator: token.operator,
                value: token.value.clone(),
            };

            match groups
                .iter_mut()
                .find(|(key, _)| *key == token.property_key.as_str())
            {
                Some((_, group)) => group.conditions.push(condition),
                None => groups.push((
                    token.property_key.as_str(),
                    FieldGroup {
                        field: field.to_string(),
                        conditions: vec![condition],
                    },
                )),
            }
        }

        Ok(BackendQuery {
            groups: groups.into_iter().map(|(_, g)| g).collect(),
            operation: query.operation(),
        })
    }
}

/// One translator per resource kind, injected into views and pickers.
#[derive(Debug, Clone)]
pub struct TranslatorRegistry {
    tables: BTreeMap<ResourceKind, Arc<FilterTranslator>>,
}

impl TranslatorRegistry {
    /// Registry populated with the built-in table for every kind.
    pub fn builtin() -> Self {
        let tables = ResourceKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(FilterTranslator::for_kind(kind))))
            .collect();
        Self { tables }
    }

    /// Replace the table for the translator's kind.
    pub fn with_translator(mut self, translator: FilterTranslator) -> Self {
        self.tables.insert(translator.kind(), Arc::new(translator));
        self
    }

    pub fn get(&self, kind: ResourceKind) -> Arc<FilterTranslator> {
        match self.tables.get(&kind) {
            Some(t) => t.clone(),
            None => Arc::new(FilterTranslator::for_kind(kind)),
        }
    }
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
