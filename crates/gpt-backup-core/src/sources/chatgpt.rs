//! HTTP client for the conversation backend.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::redirect::Policy;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{ConversationSource, PageSource};
use crate::config::HarvestConfig;
use crate::models::{ConversationPage, ConversationRef, RawConversation};

/// Bearer-authenticated client for the listing and per-id endpoints.
#[derive(Debug, Clone)]
pub struct ChatGptClient {
    http_client: reqwest::Client,
    base_url: String,
    page_size: u64,
}

impl ChatGptClient {
    pub fn new(base_url: &str, page_size: u64, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(5))
            .build()?;
        Self::with_client(http_client, base_url, page_size)
    }

    pub fn from_config(config: &HarvestConfig) -> Result<Self> {
        Self::new(&config.api_base_url, config.page_size, config.request_timeout())
    }

    pub fn with_client(
        http_client: reqwest::Client,
        base_url: &str,
        page_size: u64,
    ) -> Result<Self> {
        Url::parse(base_url).with_context(|| format!("invalid API base URL: {}", base_url))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size,
        })
    }

    async fn get_json<T>(&self, token: &str, url: &str, query: &[(&str, u64)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut request = self.http_client.get(url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {} from {}", status, url));
        }

        response
            .json()
            .await
            .with_context(|| format!("invalid response body from {}", url))
    }
}

#[async_trait]
impl PageSource for ChatGptClient {
    async fn get_page(&self, token: &str, offset: u64) -> Result<ConversationPage> {
        let url = format!("{}/conversations", self.base_url);
        let listing: ListingResponse = self
            .get_json(token, &url, &[("offset", offset), ("limit", self.page_size)])
            .await?;

        debug!(
            "Listing page at offset {}: {} items, total {}",
            offset,
            listing.items.len(),
            listing.total
        );

        Ok(ConversationPage {
            items: listing
                .items
                .into_iter()
                .map(|item| ConversationRef::new(item.id, offset))
                .collect(),
            total: listing.total,
        })
    }
}

#[async_trait]
impl ConversationSource for ChatGptClient {
    async fn get_conversation(&self, token: &str, id: &str) -> Result<RawConversation> {
        let url = format!("{}/conversation/{}", self.base_url, id);
        self.get_json(token, &url, &[]).await
    }
}

// ---- Backend Response Types ----

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    items: Vec<ListingItem>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    id: String,
}
