//! Ticket Backend Client
//!
//! The view-model talks to the backend through [`TicketBackend`], so the
//! HTTP implementation can be swapped for an in-memory one in tests.
//!
//! ## Endpoints
//!
//! - `GET  {tickets_path}?q=&kind=&status=` → `{ok, items}`
//! - `PATCH {tickets_path}/{id}` with `{status, note, email_client, email_subject}`

mod http;

pub use http::HttpBackend;

use crate::ticket::{Status, TicketEnvelope};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Read/write access to the externally owned ticket store
#[async_trait]
pub trait TicketBackend: Send + Sync {
    /// Fetch the ticket list matching `filters`
    async fn list_tickets(&self, filters: &ListFilters) -> Result<TicketEnvelope, ClientError>;

    /// Apply a partial update to one ticket
    async fn patch_ticket(&self, ticket: &str, patch: &PatchRequest) -> Result<(), ClientError>;

    /// Download location of an attachment
    fn attachment_url(&self, filename: &str) -> String;

    /// Location to navigate to when the session has expired
    fn login_path(&self) -> String;
}

/// Server-side filters for the ticket list. Empty means unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListFilters {
    pub q: String,
    pub kind: String,
    pub status: String,
}

impl ListFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: free-text query
    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.q = q.into().trim().to_string();
        self
    }

    /// Builder method: kind filter
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Builder method: status filter
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty() && self.kind.is_empty() && self.status.is_empty()
    }

    /// Query parameters to send, skipping empty filters
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("q", self.q.as_str()),
            ("kind", self.kind.as_str()),
            ("status", self.status.as_str()),
        ]
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }
}

/// Body of a ticket PATCH
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchRequest {
    pub status: Status,
    pub note: String,
    pub email_client: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,
}

impl PatchRequest {
    /// Status-only change: empty note, no client email
    pub fn status_only(status: Status) -> Self {
        Self {
            status,
            note: String::new(),
            email_client: false,
            email_subject: None,
        }
    }
}

/// Build `{uploads_path}/{percent-encoded filename}`
pub fn attachment_path(uploads_path: &str, filename: &str) -> String {
    format!(
        "{}/{}",
        uploads_path.trim_end_matches('/'),
        urlencoding::encode(filename)
    )
}

/// Errors talking to the ticket backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// Session missing or expired (HTTP 401)
    #[error("Not authenticated")]
    Unauthorized,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Transport-level failure (no HTTP status was received)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout | ClientError::Unavailable | ClientError::Request(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_skip_empty() {
        let filters = ListFilters::new().query("  acme ").status("open");
        assert_eq!(filters.query_pairs(), vec![("q", "acme"), ("status", "open")]);
        assert!(ListFilters::new().query_pairs().is_empty());
        assert!(ListFilters::new().is_empty());
    }

    #[test]
    fn test_patch_body_shape() {
        let body = serde_json::to_value(PatchRequest::status_only(Status::Wip)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "wip", "note": "", "email_client": false})
        );

        let body = serde_json::to_value(PatchRequest {
            status: Status::Resolved,
            note: "done".into(),
            email_client: true,
            email_subject: Some("Update on Ticket Q-1".into()),
        })
        .unwrap();
        assert_eq!(body["email_subject"], "Update on Ticket Q-1");
    }

    #[test]
    fn test_attachment_path_encodes() {
        assert_eq!(
            attachment_path("/uploads/", "site plan #2.pdf"),
            "/uploads/site%20plan%20%232.pdf"
        );
        assert_eq!(attachment_path("/uploads", "a/b.png"), "/uploads/a%2Fb.png");
    }
}
