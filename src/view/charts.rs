//! Chart series and the hour-of-week heatmap
//!
//! All series are recomputed from the full list on every render.

use crate::ticket::{Status, Ticket};
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

/// Days covered by the trend chart, today included
pub const TREND_DAYS: i64 = 14;

/// Highest heatmap intensity level
pub const HEAT_LEVELS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// `MM-DD`
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub open: usize,
    pub wip: usize,
    pub resolved: usize,
}

impl StatusCounts {
    fn add(&mut self, status: &Status) {
        match status {
            Status::Open => self.open += 1,
            Status::Wip => self.wip += 1,
            Status::Resolved => self.resolved += 1,
            Status::Other(_) => {}
        }
    }
}

/// One stacked bar: a kind split by status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindStatusBar {
    pub kind: String,
    pub counts: StatusCounts,
}

/// 7×24 ticket counts by UTC weekday (Monday = 0) and hour
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub counts: [[u32; 24]; 7],
}

impl Default for Heatmap {
    fn default() -> Self {
        Self {
            counts: [[0; 24]; 7],
        }
    }
}

impl Heatmap {
    pub fn from_tickets(items: &[Ticket]) -> Self {
        let mut map = Heatmap::default();
        for t in items {
            let day = t.created_at.weekday().num_days_from_monday() as usize;
            let hour = t.created_at.hour() as usize;
            map.counts[day][hour] += 1;
        }
        map
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().flatten().sum()
    }

    /// Largest cell count, never below 1
    pub fn max(&self) -> u32 {
        self.counts.iter().flatten().copied().max().unwrap_or(0).max(1)
    }

    /// Intensity 0..=5; 0 only for empty cells
    pub fn level(&self, day: usize, hour: usize) -> u32 {
        let v = self.counts[day][hour];
        if v == 0 {
            return 0;
        }
        let scaled = (v as f64 / self.max() as f64 * 4.0).floor() as u32;
        (1 + scaled).min(HEAT_LEVELS)
    }
}

/// Everything the chart area shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub trend: Vec<TrendPoint>,
    /// Count per kind, in order of first appearance
    pub kinds: Vec<(String, usize)>,
    pub statuses: StatusCounts,
    pub kind_status: Vec<KindStatusBar>,
    pub heatmap: Heatmap,
}

impl ChartSet {
    /// Build every chart; `today` and `tz` anchor the trend's day boundaries
    pub fn build<Tz: TimeZone>(items: &[Ticket], today: NaiveDate, tz: &Tz) -> Self {
        let mut statuses = StatusCounts::default();
        for t in items {
            statuses.add(&t.status);
        }

        Self {
            trend: trend(items, today, tz),
            kinds: kind_counts(items),
            statuses,
            kind_status: kind_status(items),
            heatmap: Heatmap::from_tickets(items),
        }
    }
}

/// Tickets created on each of the trailing [`TREND_DAYS`] days, oldest first
pub fn trend<Tz: TimeZone>(items: &[Ticket], today: NaiveDate, tz: &Tz) -> Vec<TrendPoint> {
    let created: Vec<NaiveDate> = items
        .iter()
        .map(|t| t.created_at.with_timezone(tz).date_naive())
        .collect();

    (0..TREND_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            TrendPoint {
                date,
                label: date.format("%m-%d").to_string(),
                count: created.iter().filter(|d| **d == date).count(),
            }
        })
        .collect()
}

pub fn kind_counts(items: &[Ticket]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for t in items {
        match counts.iter_mut().find(|(k, _)| *k == t.kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((t.kind.clone(), 1)),
        }
    }
    counts
}

pub fn kind_status(items: &[Ticket]) -> Vec<KindStatusBar> {
    let mut bars: Vec<KindStatusBar> = Vec::new();
    for t in items {
        let idx = match bars.iter().position(|b| b.kind == t.kind) {
            Some(i) => i,
            None => {
                bars.push(KindStatusBar {
                    kind: t.kind.clone(),
                    counts: StatusCounts::default(),
                });
                bars.len() - 1
            }
        };
        bars[idx].counts.add(&t.status);
    }
    bars
}
