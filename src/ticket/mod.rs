//! Ticket Model
//!
//! The canonical ticket record, its wire shape, and the normalization
//! between the two.

mod normalize;
pub mod text;
mod types;

pub use normalize::{normalize, normalize_at, parse_timestamp, DEFAULT_KIND};
pub use types::{HistoryEntry, RawTicket, Status, Ticket, TicketEnvelope};
