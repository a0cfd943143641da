//! Fetch coordination - concurrent per-channel requests and their tally
//!
//! [`fetch_channels`] issues one request per channel and hands every result
//! to a settle callback in arrival order. The callback turns a result into a
//! [`ChannelOutcome`]; a [`FetchTally`] counts outcomes until every request
//! has settled.
//!
//! A failed request counts as settled. The aggregate therefore always
//! completes once every channel has answered, and the failures are reported
//! instead of leaving the caller waiting.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};

use crate::core::{PlacementReport, Program};
use crate::source::{ChannelItem, ProgramQuery, SourceError};

/// How one channel's request settled.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOutcome {
    /// Programs were placed into the row.
    Placed { row: usize, report: PlacementReport },
    /// The source failed; nothing was written.
    Failed { row: usize, error: SourceError },
    /// The grid was reset while the request was in flight; result discarded.
    Stale { row: usize },
}

impl ChannelOutcome {
    pub fn row(&self) -> usize {
        match self {
            ChannelOutcome::Placed { row, .. }
            | ChannelOutcome::Failed { row, .. }
            | ChannelOutcome::Stale { row } => *row,
        }
    }
}

/// Settled-vs-expected counter for one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchTally {
    expected: usize,
    placed: usize,
    stale: usize,
    cells_written: usize,
    failed: Vec<(usize, SourceError)>,
}

impl FetchTally {
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: ChannelOutcome) {
        match outcome {
            ChannelOutcome::Placed { report, .. } => {
                self.placed += 1;
                self.cells_written += report.cells_written;
            }
            ChannelOutcome::Failed { row, error } => self.failed.push((row, error)),
            ChannelOutcome::Stale { .. } => self.stale += 1,
        }
    }

    pub fn settled(&self) -> usize {
        self.placed + self.stale + self.failed.len()
    }

    pub fn is_settled(&self) -> bool {
        self.settled() >= self.expected
    }

    pub fn into_report(self, generation: u64) -> FetchReport {
        FetchReport {
            generation,
            requested: self.expected,
            placed: self.placed,
            stale: self.stale,
            cells_written: self.cells_written,
            failed: self.failed,
        }
    }
}

/// Result of one `fetch_programs` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    /// Grid generation the fetch was issued against.
    pub generation: u64,
    pub requested: usize,
    pub placed: usize,
    pub stale: usize,
    pub cells_written: usize,
    /// Rows whose source failed, with the error.
    pub failed: Vec<(usize, SourceError)>,
}

impl FetchReport {
    /// Every channel answered and was written into the current grid.
    pub fn is_complete(&self) -> bool {
        self.placed == self.requested
    }
}

/// Request `query` from every channel concurrently.
///
/// `settle` runs once per channel, in completion order, with the row index
/// and the source's answer. Returns once every request has settled.
pub async fn fetch_channels<F>(
    channels: Vec<ChannelItem>,
    query: ProgramQuery,
    mut settle: F,
) -> FetchTally
where
    F: FnMut(usize, Result<Vec<Arc<Program>>, SourceError>) -> ChannelOutcome,
{
    let mut tally = FetchTally::new(channels.len());
    let mut pending: FuturesUnordered<_> = channels
        .into_iter()
        .map(|item| async move {
            let result = item.channel.get_programs(query).await;
            (item.index, result)
        })
        .collect();

    while let Some((row, result)) = pending.next().await {
        tally.record(settle(row, result));
    }
    debug_assert!(tally.is_settled());
    tally
}
