use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use common::{Config, Credentials};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{get, post, routes, Build, Rocket, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::remote::RemoteLlmProvider;
use crate::news::{CurrentsClient, NewsSource};
use crate::pipeline::{ContentPipeline, GeneratedContent, GenerationError, GenerationSettings};
use crate::telegram::{ChatRelay, TelegramClient, Update};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ContentPipeline>,
    /// Set when the Telegram relay is enabled
    pub relay: Option<Arc<ChatRelay>>,
}

impl AppState {
    /// Wire the real upstream clients from configuration and resolved credentials.
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let news: Arc<dyn NewsSource> = Arc::new(
            CurrentsClient::new(
                &config.news.api_url,
                &credentials.news_api_key,
                Duration::from_secs(config.news.timeout_seconds),
            )?
            .with_language(&config.news.language)
            .with_max_headlines(config.news.max_headlines),
        );

        let llm = RemoteLlmProvider::new(&config.llm.api_url, &credentials.llm_api_key, &config.llm.model)
            .with_defaults(config.llm.timeout_seconds, 500, config.llm.temperature);
        tracing::info!(model = %llm.model(), api_url = %config.llm.api_url, "LLM provider initialized");

        let settings = GenerationSettings {
            temperature: config.llm.temperature,
            language: config.llm.prompt_language,
            timeout_seconds: None,
        };
        let pipeline = Arc::new(ContentPipeline::new(news, Arc::new(llm), settings));

        let relay = match &credentials.telegram_token {
            Some(token) if config.telegram.enabled => {
                let sender = TelegramClient::new(
                    &config.telegram.api_base,
                    token,
                    Duration::from_secs(config.telegram.timeout_seconds),
                )?;
                tracing::info!("Telegram relay enabled");
                Some(Arc::new(ChatRelay::new(pipeline.clone(), Arc::new(sender))))
            }
            _ => None,
        };

        Ok(Self { pipeline, relay })
    }
}

/// Request body for `/generate-post`.
#[derive(Debug, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

/// JSON error reply: `{"detail": "..."}` with the given status.
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub detail: String,
}

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: Status::InternalServerError,
            detail: detail.into(),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match &err {
            GenerationError::News(e) => ApiError::internal(format!("news lookup failed: {}", e)),
            _ => ApiError::internal(format!("content generation failed: {}", err)),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        (self.status, Json(json!({ "detail": self.detail }))).respond_to(req)
    }
}

#[get("/")]
async fn index() -> Json<Value> {
    Json(json!({ "message": "Service is running" }))
}

#[get("/heartbeat")]
async fn heartbeat() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Generate title, meta-description and article body for a topic.
#[post("/generate-post", data = "<body>")]
async fn generate_post(
    state: &State<AppState>,
    body: Json<TopicRequest>,
) -> Result<Json<GeneratedContent>, ApiError> {
    let content = state.pipeline.generate(&body.topic).await?;
    Ok(Json(content))
}

/// Telegram webhook. The raw body is parsed here so malformed updates surface as 500.
#[post("/telegram/webhook", data = "<payload>")]
async fn telegram_webhook(relay: &State<Arc<ChatRelay>>, payload: String) -> Result<Json<Value>, ApiError> {
    let update: Update = serde_json::from_str(&payload).map_err(|e| {
        tracing::error!("failed to parse Telegram update: {}", e);
        ApiError::internal(format!("invalid Telegram update: {}", e))
    })?;

    relay.handle_update(&update).await.map_err(|e| {
        tracing::error!("Telegram delivery failed: {}", e);
        ApiError::internal(e.to_string())
    })?;

    Ok(Json(json!({ "status": "success" })))
}

/// Build the Rocket instance. The webhook route and its relay state exist only when a relay is configured.
pub fn build_rocket(state: AppState, figment: rocket::figment::Figment) -> Rocket<Build> {
    let relay = state.relay.clone();
    let rocket = rocket::custom(figment)
        .manage(state)
        .mount("/", routes![index, heartbeat, generate_post]);

    match relay {
        Some(relay) => rocket.manage(relay).mount("/", routes![telegram_webhook]),
        None => rocket,
    }
}

pub async fn launch_rocket(state: AppState, config: &Config) -> Result<()> {
    let fig = rocket::Config::figment()
        .merge(("address", config.server.bind.clone()))
        .merge(("port", config.server.port));

    tracing::info!(bind = %config.server.bind, port = config.server.port, "Starting Rocket HTTP server");
    build_rocket(state, fig)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
