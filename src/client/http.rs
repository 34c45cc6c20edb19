//! HTTP Ticket Backend
//!
//! reqwest implementation of [`TicketBackend`].

use super::{attachment_path, ClientError, ListFilters, PatchRequest, TicketBackend};
use crate::config::BackendConfig;
use crate::ticket::TicketEnvelope;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Response, StatusCode};

/// Ticket backend reached over HTTP
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Create a new backend client with the given configuration
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref() {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ClientError::InvalidConfig(format!("session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn ticket_url(&self, ticket: &str) -> String {
        format!(
            "{}/{}",
            self.config.url(&self.config.tickets_path),
            urlencoding::encode(ticket)
        )
    }

    /// Map a non-success response to an error, consuming the body
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn classify(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else if e.is_connect() {
        ClientError::Unavailable
    } else {
        ClientError::Request(e)
    }
}

#[async_trait]
impl TicketBackend for HttpBackend {
    async fn list_tickets(&self, filters: &ListFilters) -> Result<TicketEnvelope, ClientError> {
        let url = self.config.url(&self.config.tickets_path);
        tracing::debug!(%url, q = %filters.q, kind = %filters.kind, status = %filters.status, "Fetching tickets");

        let response = self
            .client
            .get(&url)
            .query(&filters.query_pairs())
            .send()
            .await
            .map_err(classify)?;

        let response = Self::check(response).await?;
        response
            .json::<TicketEnvelope>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn patch_ticket(&self, ticket: &str, patch: &PatchRequest) -> Result<(), ClientError> {
        let url = self.ticket_url(ticket);
        tracing::debug!(%url, status = %patch.status, "Patching ticket");

        let response = self
            .client
            .patch(&url)
            .json(patch)
            .send()
            .await
            .map_err(classify)?;

        Self::check(response).await.map(|_| ())
    }

    fn attachment_url(&self, filename: &str) -> String {
        self.config
            .url(&attachment_path(&self.config.uploads_path, filename))
    }

    fn login_path(&self) -> String {
        self.config.login_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::Status;
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode as AxumStatus,
        routing::{get, patch},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Recorded = Arc<Mutex<Vec<(String, Value)>>>;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn list(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let items = if params.get("q").map(String::as_str) == Some("acme") {
            json!([{"ticket": "C-1", "fields": {"Name": "Acme"}}])
        } else {
            json!([{"ticket": "C-1"}, {"ticket": "Q-2", "status": "wip"}])
        };
        Json(json!({"ok": true, "items": items}))
    }

    async fn record_patch(
        State(recorded): State<Recorded>,
        Path(ticket): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        recorded.lock().unwrap().push((ticket, body));
        Json(json!({"ok": true}))
    }

    fn backend(base_url: String) -> HttpBackend {
        HttpBackend::new(BackendConfig {
            base_url,
            ..BackendConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_tickets_passes_filters() {
        let router = Router::new().route("/admin/api/tickets", get(list));
        let backend = backend(spawn_stub(router).await);

        let all = backend.list_tickets(&ListFilters::new()).await.unwrap();
        assert!(all.ok);
        assert_eq!(all.items.len(), 2);

        let filtered = backend
            .list_tickets(&ListFilters::new().query("acme"))
            .await
            .unwrap();
        assert_eq!(filtered.items.len(), 1);
    }

    #[tokio::test]
    async fn test_patch_encodes_ticket_id() {
        let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/admin/api/tickets/:ticket", patch(record_patch))
            .with_state(recorded.clone());
        let backend = backend(spawn_stub(router).await);

        backend
            .patch_ticket("WEB 7", &PatchRequest::status_only(Status::Resolved))
            .await
            .unwrap();

        let calls = recorded.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "WEB 7");
        assert_eq!(calls[0].1["status"], "resolved");
        assert_eq!(calls[0].1["email_client"], false);
    }

    #[tokio::test]
    async fn test_unauthorized_is_distinct() {
        let router = Router::new()
            .route("/admin/api/tickets", get(|| async { AxumStatus::UNAUTHORIZED }))
            .route(
                "/admin/api/tickets/:ticket",
                patch(|| async { AxumStatus::UNAUTHORIZED }),
            );
        let backend = backend(spawn_stub(router).await);

        let err = backend.list_tickets(&ListFilters::new()).await.unwrap_err();
        assert!(err.is_unauthorized());

        let err = backend
            .patch_ticket("C-1", &PatchRequest::status_only(Status::Wip))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let router = Router::new().route(
            "/admin/api/tickets",
            get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let backend = backend(spawn_stub(router).await);

        match backend.list_tickets(&ListFilters::new()).await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = backend(format!("http://{}", addr));
        let err = backend.list_tickets(&ListFilters::new()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_urls() {
        let backend = backend("http://desk.test/".to_string());
        assert_eq!(
            backend.attachment_url("quote v2.pdf"),
            "http://desk.test/uploads/quote%20v2.pdf"
        );
        assert_eq!(backend.ticket_url("Q-1"), "http://desk.test/admin/api/tickets/Q-1");
        assert_eq!(backend.login_path(), "/admin/login");
    }

    #[tokio::test]
    async fn test_invalid_session_cookie() {
        let result = HttpBackend::new(BackendConfig {
            session_cookie: Some("bad\nvalue".into()),
            ..BackendConfig::default()
        });
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }
}
