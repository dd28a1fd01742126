//! Title -> meta-description -> article body generation, grounded in recent headlines.

use common::PromptLanguage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::llm::{LlmError, LlmProvider, LlmRequest};
use crate::news::{NewsSource, UpstreamError};
use crate::prompts;

/// One call to the text-generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Title,
    MetaDescription,
    Body,
}

impl Step {
    pub fn max_tokens(self) -> usize {
        match self {
            Step::Title => 60,
            Step::MetaDescription => 100,
            Step::Body => 1500,
        }
    }

    /// Failure text used when the service answered with nothing usable
    pub fn missing_output(self) -> &'static str {
        match self {
            Step::Title => "did not return a title",
            Step::MetaDescription => "did not return a meta-description",
            Step::Body => "did not return body text",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Title => "title",
            Step::MetaDescription => "meta-description",
            Step::Body => "body",
        })
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    News(#[from] UpstreamError),

    #[error("{step} generation failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: LlmError,
    },

    #[error("text generation service {}", .step.missing_output())]
    EmptyOutput { step: Step },
}

impl GenerationError {
    /// The pipeline step that failed, if the failure happened after the news lookup
    pub fn step(&self) -> Option<Step> {
        match self {
            GenerationError::News(_) => None,
            GenerationError::Step { step, .. } | GenerationError::EmptyOutput { step } => Some(*step),
        }
    }
}

/// Terminal artifact of a pipeline run. All fields are trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub meta_description: String,
    pub post_content: String,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub language: PromptLanguage,
    /// Per-step override of the provider's own timeout
    pub timeout_seconds: Option<u64>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            language: PromptLanguage::Ru,
            timeout_seconds: None,
        }
    }
}

pub struct ContentPipeline {
    news: Arc<dyn NewsSource>,
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl ContentPipeline {
    pub fn new(news: Arc<dyn NewsSource>, llm: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { news, llm, settings }
    }

    /// Run the three generation steps in order. Any failure discards everything produced so far.
    pub async fn generate(&self, topic: &str) -> Result<GeneratedContent, GenerationError> {
        let digest = self.news.fetch_headlines(topic).await.map_err(|e| {
            error!(%e, topic = %topic, "news lookup failed");
            GenerationError::News(e)
        })?;
        let language = self.settings.language;
        let news_context = digest.render(language);
        info!(topic = %topic, headlines = digest.headlines().len(), "generating post");

        let title = self
            .run_step(Step::Title, prompts::title(language, topic, &news_context))
            .await?;
        let meta_description = self
            .run_step(Step::MetaDescription, prompts::meta_description(language, &title))
            .await?;
        let post_content = self
            .run_step(Step::Body, prompts::body(language, topic, &news_context))
            .await?;

        Ok(GeneratedContent {
            title,
            meta_description,
            post_content,
        })
    }

    async fn run_step(&self, step: Step, prompt: String) -> Result<String, GenerationError> {
        let request = LlmRequest {
            prompt,
            max_tokens: Some(step.max_tokens()),
            temperature: Some(self.settings.temperature),
            timeout_seconds: self.settings.timeout_seconds,
        };

        let response = self.llm.generate(request).await.map_err(|source| {
            error!(%step, error = %source, "generation step failed");
            GenerationError::Step { step, source }
        })?;

        let text = response
            .content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                error!(%step, model = %response.model, "text generation service {}", step.missing_output());
                GenerationError::EmptyOutput { step }
            })?;

        debug!(
            %step,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "generation step done"
        );
        Ok(text.to_string())
    }
}
