//! Conversation id collection across listing pages.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::models::{ConversationPage, ConversationRef};
use crate::offsets::{plan, request_count, StopOffset};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::sources::PageSource;

/// Unique ids gathered by [`IdCollector::collect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedIds {
    /// Unique refs in first-seen order.
    pub ids: Vec<ConversationRef>,
    /// Total reported by the listing endpoint.
    pub total: u64,
    /// Final planned offset, or the stop offset when bounded.
    pub last_offset: u64,
    /// Progress denominator, see [`request_count`].
    pub requested: u64,
}

/// Walks the listing one page at a time, pausing between requests.
pub struct IdCollector<'a> {
    pages: &'a dyn PageSource,
    progress: &'a dyn ProgressSink,
    page_delay: Duration,
}

impl<'a> IdCollector<'a> {
    pub fn new(
        pages: &'a dyn PageSource,
        progress: &'a dyn ProgressSink,
        page_delay: Duration,
    ) -> Self {
        Self {
            pages,
            progress,
            page_delay,
        }
    }

    /// Collect ids from `start` onwards. With a bounded `stop`, the page at
    /// exactly that offset and everything after it is never requested.
    pub async fn collect(&self, token: &str, start: u64, stop: StopOffset) -> Result<CollectedIds> {
        let first = self.fetch_page(token, start).await?;
        let total = first.total;
        let offsets = plan(start, total);
        info!(
            "Listing reports {} conversations, {} more pages after offset {}",
            total,
            offsets.len(),
            start
        );

        let mut items = first.items;
        for &offset in &offsets {
            if stop == StopOffset::At(offset) {
                debug!("Reached stop offset {}", offset);
                break;
            }
            sleep(self.page_delay).await;
            let page = self.fetch_page(token, offset).await?;
            items.extend(page.items);
        }

        let ids = dedup_last_seen(items);
        let last_offset = match stop {
            StopOffset::Unbounded => offsets.last().copied().unwrap_or(start),
            StopOffset::At(stop) => stop,
        };
        let requested = request_count(total, start, stop);

        self.progress.emit(ProgressEvent::TotalOffsets(last_offset));
        self.progress.emit(ProgressEvent::RequestedMessages(requested));
        self.progress.emit(ProgressEvent::TotalMessages(total));

        info!("Collected {} unique conversation ids", ids.len());
        Ok(CollectedIds {
            ids,
            total,
            last_offset,
            requested,
        })
    }

    async fn fetch_page(&self, token: &str, offset: u64) -> Result<ConversationPage> {
        debug!("Fetching listing page at offset {}", offset);
        self.pages
            .get_page(token, offset)
            .await
            .map_err(|e| HarvestError::PageFetch {
                offset,
                reason: format!("{:#}", e),
            })
    }
}

/// Drop repeated ids. Each id keeps its first position but takes the value
/// of its last occurrence, so a later page overrides an earlier one.
pub fn dedup_last_seen(items: Vec<ConversationRef>) -> Vec<ConversationRef> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<ConversationRef> = Vec::with_capacity(items.len());

    for item in items {
        match positions.get(&item.id) {
            Some(&index) => unique[index] = item,
            None => {
                positions.insert(item.id.clone(), unique.len());
                unique.push(item);
            }
        }
    }

    unique
}
