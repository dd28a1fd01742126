#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::PromptLanguage;
use newspost::llm::{LlmError, LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use newspost::news::{NewsDigest, NewsSource, UpstreamError, MAX_HEADLINES};
use newspost::pipeline::{ContentPipeline, GenerationSettings};
use newspost::telegram::{DeliveryError, MessageSender};

/// News source returning a canned answer and counting lookups
pub struct FakeNews {
    reply: FakeNewsReply,
    pub calls: AtomicUsize,
}

pub enum FakeNewsReply {
    Titles(Vec<String>),
    Status(u16, String),
}

impl FakeNews {
    pub fn titles(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            reply: FakeNewsReply::Titles(titles.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: FakeNewsReply::Status(status, body.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NewsSource for FakeNews {
    async fn fetch_headlines(&self, _topic: &str) -> Result<NewsDigest, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            FakeNewsReply::Titles(t) => Ok(NewsDigest::from_titles(t.clone(), MAX_HEADLINES)),
            FakeNewsReply::Status(status, body) => Err(UpstreamError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// What the scripted provider answers for one call
pub enum Scripted {
    Text(&'static str),
    NoContent,
    ApiError(u16, &'static str),
}

/// LLM provider replaying scripted answers in order and recording every request
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Scripted>>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(texts: &[&'static str]) -> Arc<Self> {
        Self::new(texts.iter().map(|t| Scripted::Text(*t)).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        let content = match next {
            Some(Scripted::Text(t)) => Some(t.to_string()),
            Some(Scripted::NoContent) => None,
            Some(Scripted::ApiError(status, body)) => {
                return Err(LlmError::Api {
                    status,
                    body: body.to_string(),
                })
            }
            None => {
                return Err(LlmError::Api {
                    status: 500,
                    body: "no scripted reply left".to_string(),
                })
            }
        };
        Ok(LlmResponse {
            content,
            usage: UsageMetadata::default(),
            model: "scripted".to_string(),
        })
    }
}

/// Message sender recording deliveries; selected calls (0-based) fail
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(i64, String)>>,
    fail_calls: HashSet<usize>,
    attempts: AtomicUsize,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(calls: &[usize]) -> Arc<Self> {
        Arc::new(Self {
            fail_calls: calls.iter().copied().collect(),
            ..Self::default()
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.contains(&attempt) {
            return Err(DeliveryError::Status {
                status: 400,
                body: "Bad Request: chat not found".to_string(),
            });
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

pub fn pipeline(news: Arc<FakeNews>, llm: Arc<ScriptedLlm>) -> Arc<ContentPipeline> {
    pipeline_in(news, llm, PromptLanguage::Ru)
}

pub fn pipeline_in(news: Arc<FakeNews>, llm: Arc<ScriptedLlm>, language: PromptLanguage) -> Arc<ContentPipeline> {
    let settings = GenerationSettings {
        language,
        ..GenerationSettings::default()
    };
    Arc::new(ContentPipeline::new(news, llm, settings))
}
