//! Wire models for the gateway's administrative REST API
//!
//! List endpoints answer in the shape `{ <rows-field>: [...], count, filter,
//! ...auxiliary lookup lists }`; the auxiliary lists seed chooser contents.
//! Timestamps arrive as epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of an editable row between fetch and save.
///
/// `Persisted` is the resting state; everything else is part of the minimal
/// change-set sent on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    #[default]
    Persisted,
    New,
    Updated,
    Removed,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Option<String>,
    pub audit_target_name: String,
    pub user: String,
    pub action: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub changed: DateTime<Utc>,
    #[serde(default)]
    pub revision_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Error log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    #[serde(default)]
    pub error_signal_message_id: Option<String>,
    pub msh_role: String,
    #[serde(default)]
    pub message_in_error_id: Option<String>,
    pub error_code: String,
    #[serde(default)]
    pub error_detail: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub notified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogResult {
    pub error_log_entries: Vec<ErrorLogEntry>,
    pub count: usize,
    #[serde(default)]
    pub msh_roles: Vec<String>,
    #[serde(default)]
    pub error_codes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub user_name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Comma-joined authority names, as the backend renders them
    pub roles: String,
    #[serde(default)]
    pub domain: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub status: RowStatus,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expiration_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Plugin users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginUserRow {
    #[serde(default)]
    pub entity_id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub original_user: Option<String>,
    pub auth_roles: String,
    pub auth_type: String,
    pub active: bool,
    #[serde(default)]
    pub status: RowStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginUserResult {
    pub entries: Vec<PluginUserRow>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Parties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyIdentifier {
    pub party_id: String,
    #[serde(default)]
    pub party_id_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRef {
    #[serde(default)]
    pub entity_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRow {
    #[serde(default)]
    pub entity_id: i64,
    pub name: String,
    #[serde(default)]
    pub end_point: Option<String>,
    #[serde(default)]
    pub identifiers: Vec<PartyIdentifier>,
    #[serde(default)]
    pub processes_with_party_as_initiator: Vec<ProcessRef>,
    #[serde(default)]
    pub processes_with_party_as_responder: Vec<ProcessRef>,
}

impl PartyRow {
    /// Comma-joined identifiers for grid display
    pub fn joined_identifiers(&self) -> String {
        let mut ids: Vec<&str> = self.identifiers.iter().map(|i| i.party_id.as_str()).collect();
        ids.sort_unstable();
        ids.join(", ")
    }

    /// Processes with the party's role markers (I, R or IR), sorted by name
    pub fn joined_processes(&self) -> String {
        let mut entries: HashMap<&str, (bool, bool)> = HashMap::new();
        for p in &self.processes_with_party_as_initiator {
            entries.entry(p.name.as_str()).or_default().0 = true;
        }
        for p in &self.processes_with_party_as_responder {
            entries.entry(p.name.as_str()).or_default().1 = true;
        }
        let mut parts: Vec<String> = entries
            .into_iter()
            .map(|(name, (i, r))| {
                let marker = match (i, r) {
                    (true, true) => "(IR)",
                    (true, false) => "(I)",
                    (false, true) => "(R)",
                    (false, false) => "",
                };
                format!("{}{}", name, marker)
            })
            .collect();
        parts.sort_unstable();
        parts.join(", ")
    }
}

// ---------------------------------------------------------------------------
// JMS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JmsDestination {
    pub name: String,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub number_of_messages: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JmsDestinationsResult {
    /// Keyed by an internal destination id; only the values matter here
    pub jms_destinations: HashMap<String, JmsDestination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JmsMessage {
    pub id: String,
    #[serde(default, rename = "type")]
    pub jms_type: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub custom_properties: HashMap<String, String>,
    #[serde(default, rename = "jmsproperties")]
    pub jms_properties: HashMap<String, serde_json::Value>,
}

impl JmsMessage {
    /// The flattened custom-properties text shown in the grid
    pub fn custom_properties_text(&self) -> String {
        serde_json::to_string(&ordered(&self.custom_properties)).unwrap_or_default()
    }

    /// The flattened JMS-properties text shown in the grid
    pub fn jms_properties_text(&self) -> String {
        serde_json::to_string(&self.jms_properties).unwrap_or_default()
    }
}

fn ordered(map: &HashMap<String, String>) -> std::collections::BTreeMap<&str, &str> {
    map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JmsMessagesResult {
    pub messages: Vec<JmsMessage>,
}

/// Payload for `POST rest/jms/messages/action`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesActionRequest {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected_messages: Vec<String>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jms_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "chrono::serde::ts_milliseconds_option")]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", with = "chrono::serde::ts_milliseconds_option")]
    pub to_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

// ---------------------------------------------------------------------------
// Logging levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerEntry {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingResult {
    pub logging_entries: Vec<LoggerEntry>,
    pub count: usize,
    #[serde(default)]
    pub levels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRow {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Message filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutingCriteria {
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFilterEntry {
    #[serde(default)]
    pub entity_id: i64,
    #[serde(default)]
    pub index: usize,
    pub backend_name: String,
    #[serde(default)]
    pub routing_criterias: Vec<RoutingCriteria>,
    #[serde(default)]
    pub persisted: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub enabled_property_name: Option<String>,
}

impl MessageFilterEntry {
    /// Two filters are duplicates when backend and routing criteria match
    pub fn is_like(&self, other: &MessageFilterEntry) -> bool {
        self.backend_name == other.backend_name
            && joined_criteria(&self.routing_criterias) == joined_criteria(&other.routing_criterias)
    }
}

fn joined_criteria(criteria: &[RoutingCriteria]) -> String {
    criteria
        .iter()
        .map(|c| format!("{}{}", c.name, c.expression))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFilterResult {
    #[serde(default)]
    pub message_filter_entries: Vec<MessageFilterEntry>,
    #[serde(default)]
    pub are_filters_persisted: bool,
}

// ---------------------------------------------------------------------------
// Trust stores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustStoreEntry {
    pub name: String,
    pub subject: String,
    pub issuer: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub valid_from: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub valid_until: DateTime<Utc>,
    #[serde(default)]
    pub fingerprints: Option<String>,
    #[serde(default)]
    pub certificate_expiry_alert_days: i64,
}

impl TrustStoreEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until <= now
    }

    /// Still valid, but inside the expiry alert window
    pub fn is_about_to_expire(&self, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            return false;
        }
        let window = chrono::Duration::days(self.certificate_expiry_alert_days.max(0));
        self.valid_until - now < window
    }
}

// ---------------------------------------------------------------------------
// PMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PmodeInfo {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub configuration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Security / context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub username: String,
    #[serde(default)]
    pub authorities: Vec<String>,
    #[serde(default)]
    pub default_password_used: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_jms_message_deserializes_with_original_queue_property() {
        let json = r#"{
            "id": "ID:msg-1",
            "type": "retryMessage",
            "timestamp": 1721000000000,
            "customProperties": {"originalQueue": "cluster!backend.queue"},
            "jmsproperties": {"JMSXDeliveryCount": 3}
        }"#;
        let msg: JmsMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "ID:msg-1");
        assert_eq!(msg.jms_type.as_deref(), Some("retryMessage"));
        assert_eq!(
            msg.custom_properties.get("originalQueue").map(String::as_str),
            Some("cluster!backend.queue")
        );
        assert!(msg.custom_properties_text().contains("originalQueue"));
    }

    #[test]
    fn test_action_request_omits_absent_fields() {
        let req = MessagesActionRequest {
            source: "DLQ".to_string(),
            destination: Some("backend.queue".to_string()),
            selected_messages: vec!["m1".to_string()],
            action: "MOVE".to_string(),
            original_queue: None,
            jms_type: None,
            from_date: None,
            to_date: None,
            selector: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "MOVE");
        assert_eq!(json["selectedMessages"][0], "m1");
        assert!(json.get("originalQueue").is_none());
        assert!(json.get("fromDate").is_none());
    }

    #[test]
    fn test_row_status_round_trips_screaming_case() {
        assert_eq!(serde_json::to_string(&RowStatus::New).unwrap(), r#""NEW""#);
        let s: RowStatus = serde_json::from_str(r#""REMOVED""#).unwrap();
        assert_eq!(s, RowStatus::Removed);
    }

    #[test]
    fn test_truststore_entry_expiry_window() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let entry = TrustStoreEntry {
            name: "gw".to_string(),
            subject: "CN=gw".to_string(),
            issuer: "CN=ca".to_string(),
            valid_from: now - chrono::Duration::days(365),
            valid_until: now + chrono::Duration::days(10),
            fingerprints: None,
            certificate_expiry_alert_days: 60,
        };
        assert!(!entry.is_expired(now));
        assert!(entry.is_about_to_expire(now));

        let healthy = TrustStoreEntry {
            valid_until: now + chrono::Duration::days(90),
            ..entry.clone()
        };
        assert!(!healthy.is_about_to_expire(now));

        let expired = TrustStoreEntry {
            valid_until: now - chrono::Duration::days(1),
            ..entry
        };
        assert!(expired.is_expired(now));
        assert!(!expired.is_about_to_expire(now));
    }

    #[test]
    fn test_message_filter_duplicate_detection() {
        let a = MessageFilterEntry {
            entity_id: 1,
            index: 0,
            backend_name: "ws".to_string(),
            routing_criterias: vec![RoutingCriteria {
                name: "action".to_string(),
                expression: "submit".to_string(),
            }],
            persisted: true,
            active: true,
            enabled_property_name: None,
        };
        let mut b = a.clone();
        b.entity_id = 2;
        assert!(a.is_like(&b));
        b.routing_criterias[0].expression = "other".to_string();
        assert!(!a.is_like(&b));
    }

    #[test]
    fn test_party_joined_processes_markers() {
        let party = PartyRow {
            entity_id: 1,
            name: "blue_gw".to_string(),
            end_point: None,
            identifiers: vec![PartyIdentifier {
                party_id: "domibus-blue".to_string(),
                party_id_type: None,
            }],
            processes_with_party_as_initiator: vec![ProcessRef {
                entity_id: 0,
                name: "tc1".to_string(),
            }],
            processes_with_party_as_responder: vec![
                ProcessRef {
                    entity_id: 0,
                    name: "tc1".to_string(),
                },
                ProcessRef {
                    entity_id: 0,
                    name: "tc2".to_string(),
                },
            ],
        };
        assert_eq!(party.joined_processes(), "tc1(IR), tc2(R)");
        assert_eq!(party.joined_identifiers(), "domibus-blue");
    }
}
