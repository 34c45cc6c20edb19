//! Flat table projection: one row per ticket

use crate::ticket::text::{strip_tags, truncate_chars};
use crate::ticket::{Status, Ticket};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Characters of message shown in a table row
pub const PREVIEW_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub ticket: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Markup-free message (or note) truncated to [`PREVIEW_CHARS`]
    pub preview: String,
    pub attachments: Vec<Attachment>,
    pub status: Status,
    pub age: String,
    pub overdue: bool,
}

impl TableRow {
    pub fn build(t: &Ticket, attachment_url: &impl Fn(&str) -> String) -> Self {
        Self {
            ticket: t.ticket.clone(),
            kind: t.kind.clone(),
            created_at: t.created_at,
            name: t.name.clone(),
            email: t.email.clone(),
            phone: t.phone.clone(),
            preview: truncate_chars(&strip_tags(t.body_text()), PREVIEW_CHARS),
            attachments: t
                .attachments
                .iter()
                .map(|a| Attachment {
                    name: a.clone(),
                    url: attachment_url(a),
                })
                .collect(),
            status: t.status.clone(),
            age: format_age(t.age_hours),
            overdue: t.overdue,
        }
    }
}

/// Every ticket as a row, in list order
pub fn table_rows(items: &[Ticket], attachment_url: impl Fn(&str) -> String) -> Vec<TableRow> {
    items
        .iter()
        .map(|t| TableRow::build(t, &attachment_url))
        .collect()
}

pub fn format_age(hours: f64) -> String {
    format!("{:.1}h", hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{normalize, RawTicket};
    use serde_json::json;

    #[test]
    fn test_row_preview_and_links() {
        let raw: RawTicket = serde_json::from_value(json!({
            "ticket": "P-1",
            "kind": "Project Desk",
            "status": "wip",
            "age_hours": 3.456,
            "overdue": true,
            "attachments": ["site plan.pdf"],
            "fields": {"Name": "Lee", "Notes": format!("<b>Line one</b><br>{}", "x".repeat(300))}
        }))
        .unwrap();
        let items = vec![normalize(raw)];

        let rows = table_rows(&items, |a| format!("/uploads/{}", urlencoding::encode(a)));
        let row = &rows[0];

        assert_eq!(row.age, "3.5h");
        assert!(row.overdue);
        assert_eq!(row.status.label(), "WIP");
        assert!(row.preview.starts_with("Line one\nxxx"));
        assert_eq!(row.preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(row.attachments[0].url, "/uploads/site%20plan.pdf");
    }

    #[test]
    fn test_preview_falls_back_to_note() {
        let items = vec![normalize(RawTicket {
            ticket: "C-1".into(),
            note: Some("called, left voicemail".into()),
            ..Default::default()
        })];

        let rows = table_rows(&items, |a| a.to_string());
        assert_eq!(rows[0].preview, "called, left voicemail");
        assert_eq!(rows[0].age, "0.0h");
    }
}
