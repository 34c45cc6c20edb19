//! Plain-text dashboard rendering

use crate::ticket::text::truncate_chars;
use crate::ticket::{Status, Ticket};
use crate::view::{ChartSet, Heatmap, Kpis, Lanes, TableRow, ViewProjection};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Which projections reach the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// KPIs, lanes, table and charts
    Dashboard,
    /// Only the table
    Table,
    /// Table rows as a JSON array
    Json,
    /// Nothing; the caller prints what it needs
    Silent,
}

/// Characters of preview shown per table line
const PREVIEW_WIDTH: usize = 40;

/// Heatmap glyphs by level
const HEAT_GLYPHS: [char; 6] = [' ', '.', ':', '-', '=', '#'];

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub struct TerminalView {
    out: Box<dyn Write + Send>,
    layout: Layout,
}

impl TerminalView {
    pub fn new(out: Box<dyn Write + Send>, layout: Layout) -> Self {
        Self { out, layout }
    }

    pub fn stdout(layout: Layout) -> Self {
        Self::new(Box::new(io::stdout()), layout)
    }

    fn emit(&mut self, result: io::Result<()>) {
        if let Err(e) = result.and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }

    fn shows_dashboard(&self) -> bool {
        self.layout == Layout::Dashboard
    }
}

impl ViewProjection for TerminalView {
    fn render_kpis(&mut self, kpis: &Kpis) {
        if !self.shows_dashboard() {
            return;
        }
        let result = write_kpis(&mut self.out, kpis);
        self.emit(result);
    }

    fn render_lanes(&mut self, lanes: &Lanes<'_>) {
        if !self.shows_dashboard() {
            return;
        }
        let result = write_lanes(&mut self.out, lanes);
        self.emit(result);
    }

    fn render_table(&mut self, rows: &[TableRow]) {
        let result = match self.layout {
            Layout::Dashboard | Layout::Table => write_table(&mut self.out, rows),
            Layout::Json => serde_json::to_writer_pretty(&mut self.out, rows)
                .map_err(io::Error::from)
                .and_then(|_| writeln!(self.out)),
            Layout::Silent => return,
        };
        self.emit(result);
    }

    fn render_charts(&mut self, charts: &ChartSet) {
        if !self.shows_dashboard() {
            return;
        }
        let result = write_charts(&mut self.out, charts);
        self.emit(result);
    }
}

fn write_kpis(out: &mut dyn Write, kpis: &Kpis) -> io::Result<()> {
    writeln!(
        out,
        "Total: {}  Open: {}  In progress: {}  Resolved: {}",
        kpis.total, kpis.open, kpis.wip, kpis.resolved
    )?;
    writeln!(out)
}

fn write_lanes(out: &mut dyn Write, lanes: &Lanes<'_>) -> io::Result<()> {
    for status in Status::lanes() {
        let lane = lanes.lane(&status).unwrap_or_default();
        let ids: Vec<String> = lane.iter().map(|t| card_label(t)).collect();
        writeln!(out, "{:<9} ({:>3}) {}", status.label(), lane.len(), ids.join(" "))?;
    }
    writeln!(out)
}

fn card_label(t: &Ticket) -> String {
    if t.overdue {
        format!("{}!", t.ticket)
    } else {
        t.ticket.clone()
    }
}

/// Render rows as an aligned text table
pub fn write_table(out: &mut dyn Write, rows: &[TableRow]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(out, "No tickets");
    }

    writeln!(
        out,
        "{:<12} {:<14} {:<16} {:<18} {:<24} {:<9} {:>7}  {}",
        "Ticket", "Kind", "Created", "Name", "Email", "Status", "Age", "Message"
    )?;
    writeln!(out, "{}", "-".repeat(120))?;

    for row in rows {
        let overdue = if row.overdue { "!" } else { " " };
        writeln!(
            out,
            "{:<12} {:<14} {:<16} {:<18} {:<24} {:<9} {:>7}{} {}",
            row.ticket,
            truncate_chars(&row.kind, 14),
            row.created_at.format("%Y-%m-%d %H:%M"),
            truncate_chars(&row.name, 18),
            truncate_chars(&row.email, 24),
            row.status.label(),
            row.age,
            overdue,
            truncate_chars(&row.preview, PREVIEW_WIDTH),
        )?;
        for attachment in &row.attachments {
            writeln!(out, "{:>12} {}", "+", attachment.url)?;
        }
    }
    writeln!(out)
}

fn write_charts(out: &mut dyn Write, charts: &ChartSet) -> io::Result<()> {
    writeln!(out, "Last {} days", charts.trend.len())?;
    for point in &charts.trend {
        writeln!(out, "  {} {:>3} {}", point.label, point.count, "#".repeat(point.count))?;
    }

    writeln!(out)?;
    writeln!(out, "By kind")?;
    for (kind, count) in &charts.kinds {
        writeln!(out, "  {:<20} {:>4}", kind, count)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "By status  open {}  wip {}  resolved {}",
        charts.statuses.open, charts.statuses.wip, charts.statuses.resolved
    )?;
    for bar in &charts.kind_status {
        writeln!(
            out,
            "  {:<20} {}{}{}",
            bar.kind,
            "o".repeat(bar.counts.open),
            "w".repeat(bar.counts.wip),
            "r".repeat(bar.counts.resolved)
        )?;
    }

    writeln!(out)?;
    write_heatmap(out, &charts.heatmap)?;
    writeln!(out)
}

fn write_heatmap(out: &mut dyn Write, heatmap: &Heatmap) -> io::Result<()> {
    writeln!(out, "Submissions by hour (UTC)")?;
    writeln!(out, "     0     6     12    18")?;
    for (day, name) in WEEKDAYS.iter().enumerate() {
        let cells: String = (0..24)
            .map(|hour| HEAT_GLYPHS[heatmap.level(day, hour) as usize])
            .collect();
        writeln!(out, "{}  {}", name, cells)?;
    }
    Ok(())
}

/// In-memory writer whose contents stay readable after being handed off
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
