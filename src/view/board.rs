//! KPI counters and kanban lanes

use crate::ticket::{Status, Ticket};
use serde::Serialize;

/// Headline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub open: usize,
    pub wip: usize,
    pub resolved: usize,
}

impl Kpis {
    pub fn from_tickets(items: &[Ticket]) -> Self {
        let mut kpis = Kpis {
            total: items.len(),
            ..Default::default()
        };
        for t in items {
            match t.status {
                Status::Open => kpis.open += 1,
                Status::Wip => kpis.wip += 1,
                Status::Resolved => kpis.resolved += 1,
                Status::Other(_) => {}
            }
        }
        kpis
    }
}

/// Tickets partitioned into the three kanban lanes, list order preserved
///
/// Tickets with a non-lane status appear in no lane.
#[derive(Debug, Clone, Default)]
pub struct Lanes<'a> {
    pub open: Vec<&'a Ticket>,
    pub wip: Vec<&'a Ticket>,
    pub resolved: Vec<&'a Ticket>,
}

impl<'a> Lanes<'a> {
    pub fn partition(items: &'a [Ticket]) -> Self {
        let mut lanes = Lanes::default();
        for t in items {
            match t.status {
                Status::Open => lanes.open.push(t),
                Status::Wip => lanes.wip.push(t),
                Status::Resolved => lanes.resolved.push(t),
                Status::Other(_) => {}
            }
        }
        lanes
    }

    /// The lane for a status, if it has one
    pub fn lane(&self, status: &Status) -> Option<&[&'a Ticket]> {
        match status {
            Status::Open => Some(&self.open),
            Status::Wip => Some(&self.wip),
            Status::Resolved => Some(&self.resolved),
            Status::Other(_) => None,
        }
    }

    /// Number of tickets placed in any lane
    pub fn placed(&self) -> usize {
        self.open.len() + self.wip.len() + self.resolved.len()
    }
}
