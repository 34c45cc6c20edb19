//! Core ticket types
//!
//! - `Ticket`: the canonical, normalized record every projection is built from
//! - `RawTicket`: the backend's JSON shape, every field optional
//! - `Status`: workflow state driving lanes and row styling
//! - `HistoryEntry`: one recorded status/note change

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Workflow status of a ticket
///
/// Values outside the three lanes are kept verbatim so a newer backend
/// cannot make a ticket disappear from the table; they just never land in
/// a kanban lane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Open,
    Wip,
    Resolved,
    Other(String),
}

impl Status {
    /// The three lane statuses, in lane order
    pub fn lanes() -> [Status; 3] {
        [Status::Open, Status::Wip, Status::Resolved]
    }

    /// Parse a backend value. Case-insensitive; empty means `Open`.
    pub fn parse(value: &str) -> Self {
        let lower = value.trim().to_lowercase();
        match lower.as_str() {
            "" | "open" => Status::Open,
            "wip" => Status::Wip,
            "resolved" => Status::Resolved,
            _ => Status::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Open => "open",
            Status::Wip => "wip",
            Status::Resolved => "resolved",
            Status::Other(s) => s,
        }
    }

    /// Whether this status has a kanban lane
    pub fn is_canonical(&self) -> bool {
        !matches!(self, Status::Other(_))
    }

    /// Upper-case label used in notices and table rows
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        Status::parse(&value)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl std::str::FromStr for Status {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Status::parse(s))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One status/note change as recorded by the backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the change was saved (ISO 8601, as sent by the backend)
    #[serde(rename = "ts", default)]
    pub timestamp: String,
    /// Who made the change
    #[serde(rename = "by", default = "default_actor")]
    pub actor: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub note: String,
    /// Whether the client was emailed about this change
    #[serde(default)]
    pub email_sent: bool,
}

fn default_actor() -> String {
    "admin".to_string()
}

impl HistoryEntry {
    /// Entry recorded locally after a confirmed save
    pub fn local(status: &Status, note: &str, email_sent: bool, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            actor: default_actor(),
            status: status.as_str().to_string(),
            note: note.to_string(),
            email_sent,
        }
    }
}

/// A ticket record exactly as the backend sends it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTicket {
    #[serde(default)]
    pub ticket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overdue: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_hours: Option<f64>,
}

/// The canonical, normalized ticket
///
/// Every view (KPI counters, lanes, table rows, charts, CSV) is derived from
/// a list of these. `ticket` is the only join key between views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub ticket: String,
    pub kind: String,
    pub status: Status,
    pub note: String,
    /// Oldest first; use [`Ticket::history_newest_first`] for display
    pub history: Vec<HistoryEntry>,
    pub fields: BTreeMap<String, String>,
    pub attachments: Vec<String>,
    #[serde(rename = "ts")]
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub message: String,
    pub overdue: bool,
    pub age_hours: f64,
}

impl Ticket {
    /// Set the status, dropping the overdue flag once resolved
    pub fn set_status(&mut self, status: Status) {
        if status == Status::Resolved {
            self.overdue = false;
        }
        self.status = status;
    }

    pub fn history_newest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().rev()
    }

    /// Text shown as the ticket's body: the submitted message, else the admin note
    pub fn body_text(&self) -> &str {
        if self.message.is_empty() {
            &self.note
        } else {
            &self.message
        }
    }
}

impl From<&Ticket> for RawTicket {
    fn from(t: &Ticket) -> Self {
        Self {
            ticket: t.ticket.clone(),
            kind: Some(t.kind.clone()),
            status: Some(t.status.as_str().to_string()),
            note: Some(t.note.clone()),
            history: Some(t.history.clone()),
            fields: Some(
                t.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
            ),
            attachments: Some(t.attachments.clone()),
            ts: Some(t.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            client_email: Some(t.email.clone()),
            overdue: Some(t.overdue),
            age_hours: Some(t.age_hours),
        }
    }
}

/// Response envelope of the ticket list endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TicketEnvelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub items: Vec<RawTicket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse("OPEN"), Status::Open);
        assert_eq!(Status::parse("Wip"), Status::Wip);
        assert_eq!(Status::parse("resolved"), Status::Resolved);
        assert_eq!(Status::parse(""), Status::Open);
        assert_eq!(Status::parse("Blocked"), Status::Other("blocked".into()));
        assert!(!Status::parse("blocked").is_canonical());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&Status::Wip).unwrap();
        assert_eq!(json, "\"wip\"");

        let status: Status = serde_json::from_str("\"RESOLVED\"").unwrap();
        assert_eq!(status, Status::Resolved);
    }

    #[test]
    fn test_history_entry_defaults() {
        let entry: HistoryEntry = serde_json::from_str(r#"{"status":"wip"}"#).unwrap();
        assert_eq!(entry.actor, "admin");
        assert_eq!(entry.status, "wip");
        assert!(!entry.email_sent);
    }

    #[test]
    fn test_envelope_tolerates_sparse_items() {
        let env: TicketEnvelope =
            serde_json::from_str(r#"{"ok":true,"items":[{"ticket":"C-1"},{"ticket":"Q-2","status":"wip"}]}"#)
                .unwrap();
        assert!(env.ok);
        assert_eq!(env.items.len(), 2);
        assert_eq!(env.items[1].status.as_deref(), Some("wip"));
    }
}
