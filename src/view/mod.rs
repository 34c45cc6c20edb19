//! View Projections
//!
//! Everything the dashboard shows is derived from the canonical ticket
//! list. This module computes those derivations and defines the two seams
//! to the outside world:
//!
//! - [`ViewProjection`]: receives the KPI, lane, table and chart projections
//! - [`Shell`]: transient notices and navigation (login redirect)

mod board;
mod charts;
mod table;

pub use board::{Kpis, Lanes};
pub use charts::{
    kind_counts, kind_status, trend, ChartSet, Heatmap, KindStatusBar, StatusCounts, TrendPoint,
    HEAT_LEVELS, TREND_DAYS,
};
pub use table::{format_age, table_rows, Attachment, TableRow, PREVIEW_CHARS};

use crate::ticket::Ticket;
use chrono::{NaiveDate, TimeZone};

/// A rendering target for the dashboard
///
/// `render_all` calls these in order: KPIs, lanes, table, charts. Each call
/// carries a full rebuild, never a delta.
pub trait ViewProjection: Send {
    fn render_kpis(&mut self, kpis: &Kpis);

    fn render_lanes(&mut self, lanes: &Lanes<'_>);

    fn render_table(&mut self, rows: &[TableRow]);

    fn render_charts(&mut self, charts: &ChartSet);
}

/// The host environment of the dashboard
pub trait Shell: Send + Sync {
    /// Show a short-lived message
    fn notify(&self, message: &str);

    /// Leave the dashboard for another location
    fn navigate(&self, location: &str);

    /// Where the dashboard currently is (path and query)
    fn current_location(&self) -> String;
}

/// All projections of one ticket list
#[derive(Debug, Clone)]
pub struct Projections<'a> {
    pub kpis: Kpis,
    pub lanes: Lanes<'a>,
    pub rows: Vec<TableRow>,
    pub charts: ChartSet,
}

impl<'a> Projections<'a> {
    pub fn build<Tz: TimeZone>(
        items: &'a [Ticket],
        today: NaiveDate,
        tz: &Tz,
        attachment_url: impl Fn(&str) -> String,
    ) -> Self {
        Self {
            kpis: Kpis::from_tickets(items),
            lanes: Lanes::partition(items),
            rows: table_rows(items, attachment_url),
            charts: ChartSet::build(items, today, tz),
        }
    }

    /// Push every projection into `view`, in render order
    pub fn render(&self, view: &mut dyn ViewProjection) {
        view.render_kpis(&self.kpis);
        view.render_lanes(&self.lanes);
        view.render_table(&self.rows);
        view.render_charts(&self.charts);
    }
}
