//! Backend collaborators used by the harvest pipeline.
//!
//! The pipeline only depends on these traits; [`ChatGptClient`] is the
//! HTTP implementation used by the CLI, tests substitute in-memory fakes.

mod chatgpt;

pub use chatgpt::ChatGptClient;

use async_trait::async_trait;

use crate::models::{ConversationPage, RawConversation};

/// Paginated conversation listing.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page starting at `offset`. Items are tagged with `offset`.
    async fn get_page(&self, token: &str, offset: u64) -> anyhow::Result<ConversationPage>;
}

/// Per-id conversation retrieval.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    async fn get_conversation(&self, token: &str, id: &str) -> anyhow::Result<RawConversation>;
}
