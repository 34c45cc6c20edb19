//! Raw → canonical ticket mapping
//!
//! Applies a default to every optional field and derives the contact
//! fields from the submission's labelled values. Idempotent: feeding a
//! normalized ticket back through `RawTicket::from` and `normalize` yields
//! an equal ticket.

use super::types::{RawTicket, Status, Ticket};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::BTreeMap;

pub const DEFAULT_KIND: &str = "Contact";

const NAME_KEYS: &[&str] = &["Name", "Organisation / Dept"];
const EMAIL_KEYS: &[&str] = &["Email"];
const PHONE_KEYS: &[&str] = &["Phone"];
const MESSAGE_KEYS: &[&str] = &["Notes", "Message"];

/// Normalize a raw record, using the current time for a missing timestamp
pub fn normalize(raw: RawTicket) -> Ticket {
    normalize_at(raw, Utc::now())
}

/// Normalize a raw record with an explicit fallback timestamp
pub fn normalize_at(raw: RawTicket, now: DateTime<Utc>) -> Ticket {
    let fields: BTreeMap<String, String> = raw
        .fields
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, value_text(v)))
        .collect();

    let email = raw
        .client_email
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| lookup(&fields, EMAIL_KEYS));
    let name = lookup(&fields, NAME_KEYS);
    let phone = lookup(&fields, PHONE_KEYS);
    let message = lookup(&fields, MESSAGE_KEYS);

    Ticket {
        ticket: raw.ticket,
        kind: raw
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_KIND.to_string()),
        status: Status::parse(raw.status.as_deref().unwrap_or_default()),
        note: raw.note.unwrap_or_default(),
        history: raw.history.unwrap_or_default(),
        attachments: raw.attachments.unwrap_or_default(),
        created_at: raw
            .ts
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now),
        email,
        name,
        phone,
        message,
        fields,
        overdue: raw.overdue.unwrap_or(false),
        age_hours: raw.age_hours.filter(|h| h.is_finite()).unwrap_or(0.0),
    }
}

/// Parse a backend timestamp
///
/// RFC 3339 first; a naive `YYYY-MM-DDTHH:MM:SS[.f]` is taken as UTC.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
    for fmt in formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(naive.and_utc());
        }
    }

    None
}

fn lookup(fields: &BTreeMap<String, String>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn value_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::types::HistoryEntry;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawTicket {
        serde_json::from_value(value).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        let t = normalize_at(raw(json!({"ticket": "C-1"})), fixed_now());

        assert_eq!(t.ticket, "C-1");
        assert_eq!(t.kind, "Contact");
        assert_eq!(t.status, Status::Open);
        assert_eq!(t.note, "");
        assert!(t.history.is_empty());
        assert!(t.attachments.is_empty());
        assert_eq!(t.created_at, fixed_now());
        assert!(!t.overdue);
        assert_eq!(t.age_hours, 0.0);
    }

    #[test]
    fn test_contact_field_fallbacks() {
        let t = normalize_at(
            raw(json!({
                "ticket": "P-1",
                "kind": "Project Desk",
                "status": "WIP",
                "fields": {
                    "Organisation / Dept": "Acme Works",
                    "Name": "",
                    "Email": "ops@acme.test",
                    "Phone": "+1 555 0100",
                    "Message": "fallback body",
                    "Site Visit": "Yes"
                }
            })),
            fixed_now(),
        );

        assert_eq!(t.status, Status::Wip);
        assert_eq!(t.name, "Acme Works");
        assert_eq!(t.email, "ops@acme.test");
        assert_eq!(t.phone, "+1 555 0100");
        assert_eq!(t.message, "fallback body");
    }

    #[test]
    fn test_client_email_wins_over_fields() {
        let t = normalize_at(
            raw(json!({
                "ticket": "C-2",
                "client_email": "direct@x.test",
                "fields": {"Email": "form@x.test", "Notes": "n", "Message": "m"}
            })),
            fixed_now(),
        );

        assert_eq!(t.email, "direct@x.test");
        assert_eq!(t.message, "n");
    }

    #[test]
    fn test_non_string_field_values() {
        let t = normalize_at(
            raw(json!({"ticket": "Q-1", "fields": {"Voltage": 11, "When": null}})),
            fixed_now(),
        );

        assert_eq!(t.fields["Voltage"], "11");
        assert_eq!(t.fields["When"], "");
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-02T08:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-02T10:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-02T08:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-02T08:30:00.250000Z").map(|d| d.timestamp_millis()),
            Some(expected.timestamp_millis() + 250)
        );
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_bad_timestamp_falls_back_to_now() {
        let t = normalize_at(raw(json!({"ticket": "C-3", "ts": "yesterday"})), fixed_now());
        assert_eq!(t.created_at, fixed_now());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = vec![
            json!({"ticket": "C-1"}),
            json!({
                "ticket": "Q-9",
                "kind": "Quick Quote",
                "status": "Resolved",
                "note": "called back",
                "ts": "2024-04-30T09:15:42.123456Z",
                "client_email": "",
                "fields": {"Name": "Dana", "Email": "dana@x.test", "Notes": "a<br>b", "kW": 40},
                "attachments": ["plan.pdf"],
                "history": [{"ts": "2024-04-30T10:00:00Z", "by": "ops", "status": "resolved", "note": "", "email_sent": true}],
                "overdue": true,
                "age_hours": 26.5
            }),
            json!({"ticket": "X-1", "status": "escalated", "ts": "2024-01-01T00:00:00"}),
        ];

        for sample in samples {
            let once = normalize_at(raw(sample), fixed_now());
            let later = fixed_now() + chrono::Duration::hours(3);
            let twice = normalize_at(RawTicket::from(&once), later);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_history_preserved_in_order() {
        let t = normalize_at(
            raw(json!({
                "ticket": "C-4",
                "history": [
                    {"ts": "2024-01-01T00:00:00Z", "status": "wip"},
                    {"ts": "2024-01-02T00:00:00Z", "status": "resolved"}
                ]
            })),
            fixed_now(),
        );

        let newest: Vec<&HistoryEntry> = t.history_newest_first().collect();
        assert_eq!(newest[0].status, "resolved");
        assert_eq!(newest[1].status, "wip");
    }
}
