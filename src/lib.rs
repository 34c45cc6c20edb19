//! # Ticketdesk
//!
//! Admin client for a customer ticket desk: fetches submissions from the
//! backend, keeps one canonical ticket list, and derives every dashboard
//! view from it.
//!
//! ## Features
//!
//! - **Single source of truth**: KPIs, kanban lanes, table rows, charts and
//!   CSV exports are rebuilt from the same list after every change
//! - **Failure tolerant**: network errors leave the last good view in place;
//!   only an expired session navigates away
//! - **Bulk updates**: concurrent status patches with one render pass
//! - **Auto-refresh**: periodic re-fetch with the current filters
//! - **Public forms**: validated quote, contact and project submissions
//!
//! ## Modules
//!
//! - [`ticket`]: ticket record, wire shape and normalization
//! - [`client`]: backend trait and HTTP implementation
//! - [`view`]: projections and the rendering seams
//! - [`model`]: the view-model that ties them together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ticketdesk::client::{HttpBackend, ListFilters};
//! use ticketdesk::config::Config;
//! use ticketdesk::model::TicketViewModel;
//! use ticketdesk::render::{ConsoleShell, Layout, TerminalView};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let shell = ConsoleShell::new(&config.backend.base_url, &config.backend.dashboard_path);
//!     let backend = HttpBackend::new(config.backend)?;
//!
//!     let mut model = TicketViewModel::new(
//!         Arc::new(backend),
//!         Box::new(TerminalView::stdout(Layout::Dashboard)),
//!         Arc::new(shell),
//!     );
//!
//!     model.fetch_and_render(ListFilters::new().status("open")).await;
//!     println!("{} open tickets", model.items().len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod export;
pub mod forms;
pub mod model;
pub mod prefs;
pub mod render;
pub mod ticket;
pub mod view;

pub use client::{ClientError, HttpBackend, ListFilters, PatchRequest, TicketBackend};

pub use config::{Config, ConfigError};

pub use export::ExportError;

pub use forms::{ContactRequest, FormClient, FormError, ProjectDraft, ProjectRequest, QuoteRequest};

pub use model::{
    BulkOutcome, FetchOutcome, PatchOutcome, SharedViewModel, TicketEdit, TicketViewModel,
};

pub use prefs::{PrefsError, PrefsStore, Theme};

pub use ticket::{normalize, HistoryEntry, RawTicket, Status, Ticket};

pub use view::{Shell, ViewProjection};
