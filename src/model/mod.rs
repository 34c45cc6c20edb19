//! Ticket View-Model
//!
//! Owns the canonical ticket list and keeps every projection consistent
//! with it.
//!
//! ## Flow
//!
//! 1. A user action or timer tick calls into the view-model
//! 2. The backend request completes (or fails)
//! 3. On success the canonical list is replaced or patched in place
//! 4. `render_all` rebuilds every projection from the full list
//!
//! Network failures never touch the list: they surface as a notice on the
//! [`Shell`] and the last good view stays up. A 401 is the only thing that
//! navigates away.

mod refresh;

pub use refresh::{disable_auto_refresh, enable_auto_refresh, SharedViewModel};

use crate::client::{ClientError, ListFilters, PatchRequest, TicketBackend};
use crate::export::{export_csv, ExportError};
use crate::ticket::{normalize, HistoryEntry, Status, Ticket};
use crate::view::{Projections, Shell, ViewProjection};
use chrono::{Local, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Result of a list fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// List replaced with this many tickets
    Loaded(usize),
    /// Session expired; navigated to the login location
    Unauthorized,
    /// Request failed; previous list kept
    Failed,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Loaded(_))
    }
}

/// Result of a single ticket update
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    Unauthorized,
    Failed,
}

impl PatchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, PatchOutcome::Applied)
    }
}

/// Per-request tally of a bulk update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub requested: usize,
    pub succeeded: usize,
    /// Ids whose PATCH failed (they are still updated locally)
    pub failed: Vec<String>,
}

/// A drawer edit: status, note and optional client email
#[derive(Debug, Clone, PartialEq)]
pub struct TicketEdit {
    pub status: Status,
    pub note: String,
    pub email_client: bool,
    pub email_subject: Option<String>,
}

impl TicketEdit {
    fn into_patch(self, ticket: &str) -> PatchRequest {
        let subject = self
            .email_subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_email_subject(ticket));

        PatchRequest {
            status: self.status,
            note: self.note.trim().to_string(),
            email_client: self.email_client,
            email_subject: Some(subject),
        }
    }
}

pub fn default_email_subject(ticket: &str) -> String {
    format!("Update on Ticket {}", ticket)
}

/// The single source of truth for the dashboard
pub struct TicketViewModel {
    backend: Arc<dyn TicketBackend>,
    view: Box<dyn ViewProjection>,
    shell: Arc<dyn Shell>,
    items: Vec<Ticket>,
    filters: ListFilters,
    refresh_task: Option<AbortHandle>,
    renders: u64,
}

impl TicketViewModel {
    pub fn new(
        backend: Arc<dyn TicketBackend>,
        view: Box<dyn ViewProjection>,
        shell: Arc<dyn Shell>,
    ) -> Self {
        Self {
            backend,
            view,
            shell,
            items: Vec::new(),
            filters: ListFilters::default(),
            refresh_task: None,
            renders: 0,
        }
    }

    /// Wrap for sharing with the auto-refresh task
    pub fn into_shared(self) -> SharedViewModel {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    /// The canonical list, newest first
    pub fn items(&self) -> &[Ticket] {
        &self.items
    }

    pub fn find(&self, ticket: &str) -> Option<&Ticket> {
        self.items.iter().find(|t| t.ticket == ticket)
    }

    pub fn filters(&self) -> &ListFilters {
        &self.filters
    }

    /// Replace the filters used by the next refresh, without fetching
    pub fn set_filters(&mut self, filters: ListFilters) {
        self.filters = filters;
    }

    /// Number of completed render passes
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Fetch with new filters and re-render on success
    pub async fn fetch_and_render(&mut self, filters: ListFilters) -> FetchOutcome {
        self.filters = filters;
        self.refresh().await
    }

    /// Fetch with the current filters and re-render on success
    pub async fn refresh(&mut self) -> FetchOutcome {
        let result = self.backend.list_tickets(&self.filters).await;

        match result {
            Ok(envelope) if envelope.ok => {
                let mut items: Vec<Ticket> = envelope.items.into_iter().map(normalize).collect();
                items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                let count = items.len();

                self.items = items;
                tracing::info!(count, "Loaded tickets");
                self.render_all();
                FetchOutcome::Loaded(count)
            }
            Ok(_) => {
                tracing::warn!("Ticket list returned ok=false");
                self.shell.notify("Load failed");
                FetchOutcome::Failed
            }
            Err(ClientError::Unauthorized) => {
                tracing::warn!("Ticket list rejected: not authenticated");
                self.stop_auto_refresh();
                self.shell.navigate(&self.backend.login_path());
                FetchOutcome::Unauthorized
            }
            Err(e @ ClientError::Api { .. }) => {
                tracing::warn!(error = %e, "Failed to load tickets");
                self.shell.notify("Load failed");
                FetchOutcome::Failed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Network error loading tickets");
                self.shell.notify("Network error");
                FetchOutcome::Failed
            }
        }
    }

    /// Send a partial update for one ticket
    ///
    /// Local state is left alone; callers apply the change themselves so a
    /// batch can patch many tickets before a single render.
    pub async fn patch(&mut self, ticket: &str, patch: &PatchRequest) -> PatchOutcome {
        let result = self.backend.patch_ticket(ticket, patch).await;
        self.settle(ticket, result)
    }

    fn settle(&mut self, ticket: &str, result: Result<(), ClientError>) -> PatchOutcome {
        match result {
            Ok(()) => {
                tracing::debug!(ticket = %ticket, "Ticket patched");
                PatchOutcome::Applied
            }
            Err(ClientError::Unauthorized) => {
                tracing::warn!(ticket = %ticket, "Ticket update rejected: not authenticated");
                self.handle_patch_unauthorized();
                PatchOutcome::Unauthorized
            }
            Err(e) => {
                tracing::warn!(ticket = %ticket, error = %e, "Ticket update failed");
                PatchOutcome::Failed
            }
        }
    }

    fn handle_patch_unauthorized(&mut self) {
        self.stop_auto_refresh();

        let login = self.backend.login_path();
        let here = self.shell.current_location();
        if !here.starts_with(&login) {
            let target = format!("{}?next={}", login, urlencoding::encode(&here));
            self.shell.navigate(&target);
        }
    }

    /// Change one ticket's status (card buttons, lane drops)
    pub async fn quick_update(&mut self, ticket: &str, status: Status) -> PatchOutcome {
        let outcome = self
            .patch(ticket, &PatchRequest::status_only(status.clone()))
            .await;
        if !outcome.is_ok() {
            self.shell.notify("Update failed");
            return outcome;
        }

        if let Some(t) = self.items.iter_mut().find(|t| t.ticket == ticket) {
            t.set_status(status.clone());
        }
        self.shell.notify(&format!("Marked {}", status.label()));
        self.render_all();
        outcome
    }

    /// Change many tickets' status with one render pass
    ///
    /// Patches run concurrently. Every given id is updated locally once all
    /// requests settle, including ids whose request failed; those are
    /// reported in the returned outcome.
    pub async fn bulk_update(&mut self, tickets: &[String], status: Status) -> BulkOutcome {
        if tickets.is_empty() {
            self.shell.notify("Select rows first");
            return BulkOutcome::default();
        }

        let patch = PatchRequest::status_only(status.clone());
        let backend = Arc::clone(&self.backend);
        let results = join_all(tickets.iter().map(|id| backend.patch_ticket(id, &patch))).await;

        let mut outcome = BulkOutcome {
            requested: tickets.len(),
            ..Default::default()
        };
        let mut unauthorized = false;
        for (id, result) in tickets.iter().zip(results) {
            match result {
                Ok(()) => outcome.succeeded += 1,
                Err(e) => {
                    unauthorized |= e.is_unauthorized();
                    tracing::warn!(ticket = %id, error = %e, "Bulk update request failed");
                    outcome.failed.push(id.clone());
                }
            }
        }
        if unauthorized {
            self.handle_patch_unauthorized();
        }

        for t in self.items.iter_mut().filter(|t| tickets.contains(&t.ticket)) {
            t.set_status(status.clone());
        }

        tracing::info!(
            requested = outcome.requested,
            succeeded = outcome.succeeded,
            status = %status,
            "Bulk update applied"
        );
        self.shell
            .notify(&format!("Updated {} → {}", tickets.len(), status.label()));
        self.render_all();
        outcome
    }

    /// Save a drawer edit and record it in the ticket's history
    pub async fn save_edit(&mut self, ticket: &str, edit: TicketEdit) -> PatchOutcome {
        let patch = edit.into_patch(ticket);
        let outcome = self.patch(ticket, &patch).await;
        if !outcome.is_ok() {
            self.shell.notify("Could not save");
            return outcome;
        }

        if let Some(t) = self.items.iter_mut().find(|t| t.ticket == ticket) {
            t.set_status(patch.status.clone());
            t.note = patch.note.clone();
            t.history.push(HistoryEntry::local(
                &patch.status,
                &patch.note,
                patch.email_client,
                Utc::now(),
            ));
        }
        self.shell.notify("Saved");
        self.render_all();
        outcome
    }

    /// Rebuild every projection from the full list
    pub fn render_all(&mut self) {
        let backend = &self.backend;
        let projections = Projections::build(
            &self.items,
            Local::now().date_naive(),
            &Local,
            |name| backend.attachment_url(name),
        );
        projections.render(self.view.as_mut());
        self.renders += 1;
    }

    /// CSV of the current view; notifies when there is nothing to export
    pub fn export_csv(&self) -> Result<String, ExportError> {
        let result = export_csv(&self.items);
        if let Err(ExportError::Empty) = result {
            self.shell.notify("Nothing to export");
        }
        result
    }

    pub fn is_auto_refresh_enabled(&self) -> bool {
        self.refresh_task
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn set_refresh_task(&mut self, handle: AbortHandle) {
        self.stop_auto_refresh();
        self.refresh_task = Some(handle);
    }

    /// Cancel the auto-refresh timer, if running
    pub fn stop_auto_refresh(&mut self) {
        if let Some(handle) = self.refresh_task.take() {
            tracing::info!("Auto-refresh stopped");
            handle.abort();
        }
    }
}

impl Drop for TicketViewModel {
    fn drop(&mut self) {
        self.stop_auto_refresh();
    }
}
