//! Incremental harvesting of a remote conversation history.
//!
//! The pipeline lists conversation ids page by page, fetches each
//! conversation with bounded retries, flattens its message tree and hands
//! the complete record list to an [`ArchiveSink`].

pub mod archive;
pub mod backoff;
pub mod collector;
pub mod config;
pub mod error;
pub mod harvest;
pub mod models;
pub mod normalize;
pub mod offsets;
pub mod progress;
pub mod sources;

pub use archive::{archive_file_name, ArchiveSink, JsonFileSink};
pub use backoff::{fetch_with_backoff, BackoffPolicy};
pub use collector::{dedup_last_seen, CollectedIds, IdCollector};
pub use config::HarvestConfig;
pub use error::{AuthError, HarvestError, Result};
pub use harvest::{HarvestSettings, Harvester};
pub use models::{
    Conversation, ConversationPage, ConversationRef, NormalizedMessage, RawConversation,
    RawMessage, RawNode,
};
pub use normalize::{normalize, MessageContent};
pub use offsets::{plan, request_count, StopOffset, PAGE_SIZE};
pub use progress::{ProgressEvent, ProgressSink, StdoutProgress};
pub use sources::{ChatGptClient, ConversationSource, PageSource};

pub use gpt_backup_auth::{SessionTokenProvider, StaticTokenProvider, TokenProvider};
