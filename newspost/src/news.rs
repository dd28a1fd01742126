//! Headline lookup against the Currents news search API.

use anyhow::{Context, Result};
use common::PromptLanguage;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Default number of headlines kept in a digest
pub const MAX_HEADLINES: usize = 5;

/// Failure reported by the news search service
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Currents API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Currents API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Currents API returned an unexpected body: {0}")]
    Schema(String),
}

/// Recent headlines used as grounding context for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsDigest {
    Headlines(Vec<String>),
    /// Upstream had nothing for the topic
    NoRecentNews,
}

impl NewsDigest {
    /// Keep the first `limit` titles in upstream order. No titles gives the placeholder.
    pub fn from_titles<I>(titles: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let headlines: Vec<String> = titles.into_iter().take(limit).collect();
        if headlines.is_empty() {
            NewsDigest::NoRecentNews
        } else {
            NewsDigest::Headlines(headlines)
        }
    }

    pub fn headlines(&self) -> &[String] {
        match self {
            NewsDigest::Headlines(h) => h,
            NewsDigest::NoRecentNews => &[],
        }
    }

    /// Text embedded into prompts: one `- title` line per headline, or the placeholder.
    pub fn render(&self, language: PromptLanguage) -> String {
        match self {
            NewsDigest::Headlines(h) => h
                .iter()
                .map(|title| format!("- {}", title))
                .collect::<Vec<_>>()
                .join("\n"),
            NewsDigest::NoRecentNews => match language {
                PromptLanguage::Ru => "Нет свежих новостей".to_string(),
                PromptLanguage::En => "No recent news".to_string(),
            },
        }
    }
}

/// Source of recent headlines for a topic
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_headlines(&self, topic: &str) -> Result<NewsDigest, UpstreamError>;
}

/// Client for the Currents `latest-news` endpoint
pub struct CurrentsClient {
    api_url: String,
    api_key: String,
    language: String,
    max_headlines: usize,
    client: Client,
}

impl CurrentsClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("newspost/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            language: "en".to_string(),
            max_headlines: MAX_HEADLINES,
            client,
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_max_headlines(mut self, max_headlines: usize) -> Self {
        self.max_headlines = max_headlines;
        self
    }
}

#[derive(Debug, Deserialize)]
struct LatestNews {
    #[serde(default)]
    news: Option<Vec<Article>>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
}

#[async_trait::async_trait]
impl NewsSource for CurrentsClient {
    async fn fetch_headlines(&self, topic: &str) -> Result<NewsDigest, UpstreamError> {
        debug!(keywords = %topic, language = %self.language, "Currents API request");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("language", self.language.as_str()),
                ("keywords", topic),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body_len = body.len(), "Currents API response");

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: LatestNews =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Schema(e.to_string()))?;

        // Items without a title are skipped, not fatal
        let titles = parsed.news.unwrap_or_default().into_iter().filter_map(|a| a.title);
        let digest = NewsDigest::from_titles(titles, self.max_headlines);
        if digest == NewsDigest::NoRecentNews {
            info!(topic = %topic, "no recent news for topic");
        }
        Ok(digest)
    }
}
