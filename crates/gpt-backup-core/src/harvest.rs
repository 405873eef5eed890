//! End-to-end harvest: token, ids, then every conversation in turn.
//!
//! Everything runs sequentially. Each conversation fetch is preceded by a
//! fixed throttle delay, which keeps the run at roughly one request per
//! second and holds at most one response in memory. The first fatal error
//! ends the run and nothing fetched so far is returned.

use std::time::Duration;

use gpt_backup_auth::TokenProvider;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::backoff::{fetch_with_backoff, BackoffPolicy};
use crate::collector::IdCollector;
use crate::config::HarvestConfig;
use crate::error::Result;
use crate::models::Conversation;
use crate::normalize::normalize;
use crate::offsets::{StopOffset, PAGE_SIZE};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::sources::{ConversationSource, PageSource};

/// Emit a progress line once per this many produced conversations.
const PROGRESS_EVERY: usize = PAGE_SIZE as usize;

/// Pacing and retry settings for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSettings {
    pub page_delay: Duration,
    pub throttle: Duration,
    pub backoff: BackoffPolicy,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self::from(&HarvestConfig::default())
    }
}

impl From<&HarvestConfig> for HarvestSettings {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            page_delay: config.page_delay(),
            throttle: config.throttle(),
            backoff: config.backoff_policy(),
        }
    }
}

/// Drives one harvest run over the given collaborators.
pub struct Harvester<'a> {
    tokens: &'a dyn TokenProvider,
    pages: &'a dyn PageSource,
    conversations: &'a dyn ConversationSource,
    progress: &'a dyn ProgressSink,
    settings: HarvestSettings,
}

impl<'a> Harvester<'a> {
    pub fn new(
        tokens: &'a dyn TokenProvider,
        pages: &'a dyn PageSource,
        conversations: &'a dyn ConversationSource,
        progress: &'a dyn ProgressSink,
        settings: HarvestSettings,
    ) -> Self {
        Self {
            tokens,
            pages,
            conversations,
            progress,
            settings,
        }
    }

    /// Harvest every conversation listed from `start` up to `stop`, in
    /// listing order.
    pub async fn run(&self, start: u64, stop: StopOffset) -> Result<Vec<Conversation>> {
        info!("Starting harvest (start offset {}, stop offset {})", start, stop);
        let token = self.tokens.get_token().await?;

        let collected = IdCollector::new(self.pages, self.progress, self.settings.page_delay)
            .collect(&token, start, stop)
            .await?;

        let mut conversations = Vec::with_capacity(collected.ids.len());
        for conversation_ref in &collected.ids {
            sleep(self.settings.throttle).await;

            if conversations.len() % PROGRESS_EVERY == 0 {
                self.progress.emit(ProgressEvent::progress(
                    collected.requested,
                    conversations.len(),
                    conversation_ref.offset,
                ));
            }

            let label = format!("conversation {}", conversation_ref.id);
            let raw = fetch_with_backoff(&self.settings.backoff, &label, || {
                self.conversations
                    .get_conversation(&token, &conversation_ref.id)
            })
            .await?;

            let conversation = normalize(&raw);
            debug!(
                "Normalized {} ({} messages)",
                conversation_ref.id,
                conversation.messages.len()
            );
            conversations.push(conversation);
        }

        self.progress.emit(ProgressEvent::Progress {
            percent: 100,
            offset: collected.last_offset,
        });
        info!("Harvested {} conversations", conversations.len());

        Ok(conversations)
    }
}
