//! Server-side state behind the dashboard page.
//!
//! Every chart owns a [`ChartSlot`]. Starting a query hands out a [`Ticket`]
//! carrying the slot's generation; only the holder of the latest ticket may
//! commit a result, so a slow response for a previous repository can never
//! overwrite the current one.

use crate::models::{ChartSeries, CrawlReport, OperationTotals};
use crate::repo::RepoRef;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct ChartSlot<T> {
    #[serde(skip)]
    generation: u64,
    pub repo: Option<String>,
    pub status: ChartStatus,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Default> ChartSlot<T> {
    pub fn begin(&mut self, repo: &RepoRef) -> Ticket {
        self.generation += 1;
        self.repo = Some(repo.to_string());
        self.status = ChartStatus::Loading;
        self.data = T::default();
        self.error = None;
        Ticket(self.generation)
    }

    /// Drops whatever is shown and orphans any outstanding ticket.
    pub fn invalidate(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation == ticket.0
    }

    /// Returns whether the outcome was applied.
    pub fn commit(&mut self, ticket: Ticket, outcome: Result<T, String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let prev = std::mem::take(self);
        *self = reduce(prev, ticket, outcome);
        true
    }
}

/// Next state of a slot after a response arrives. Stale tickets leave the
/// slot untouched; otherwise the data is replaced wholesale.
pub fn reduce<T: Default>(prev: ChartSlot<T>, ticket: Ticket, outcome: Result<T, String>) -> ChartSlot<T> {
    if !prev.is_current(ticket) {
        return prev;
    }
    match outcome {
        Ok(data) => ChartSlot {
            status: ChartStatus::Ready,
            data,
            error: None,
            ..prev
        },
        Err(error) => ChartSlot {
            status: ChartStatus::Failed,
            data: T::default(),
            error: Some(error),
            ..prev
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchTicket {
    search: Ticket,
    pub operation_count: Ticket,
    pub operation_history: Ticket,
    pub author_rank: Ticket,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Dashboard {
    #[serde(skip)]
    generation: u64,
    pub status: SearchStatus,
    pub repo: Option<RepoRef>,
    pub crawl: Option<CrawlReport>,
    pub operation_count: ChartSlot<OperationTotals>,
    pub operation_history: ChartSlot<ChartSeries>,
    pub author_rank: ChartSlot<ChartSeries>,
}

impl Dashboard {
    pub fn begin_search(&mut self, repo: RepoRef) -> SearchTicket {
        self.generation += 1;
        self.status = SearchStatus::Searching;
        self.crawl = None;
        let ticket = SearchTicket {
            search: Ticket(self.generation),
            operation_count: self.operation_count.begin(&repo),
            operation_history: self.operation_history.begin(&repo),
            author_rank: self.author_rank.begin(&repo),
        };
        self.repo = Some(repo);
        ticket
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.generation == ticket.search.0
    }

    pub fn record_crawl(&mut self, ticket: &SearchTicket, report: CrawlReport) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.crawl = Some(report);
        true
    }

    pub fn finish_search(&mut self, ticket: &SearchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.status = SearchStatus::Done;
        true
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.status = SearchStatus::Idle;
        self.repo = None;
        self.crawl = None;
        self.operation_count.invalidate();
        self.operation_history.invalidate();
        self.author_rank.invalidate();
    }
}
