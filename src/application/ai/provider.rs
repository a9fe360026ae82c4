use crate::domain::errors::AppError;
use crate::domain::ports::AiProvider;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// OpenAI-compatible chat-completions client. Treats the AI provider as the
/// opaque text-completion service spec §1 describes: one prompt in, one
/// completion string out, no streaming, no tool use.
pub struct ReqwestAiProvider {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageOwned,
}

#[derive(Deserialize)]
struct ChatMessageOwned {
    content: String,
}

impl ReqwestAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: HttpClientFactory::with_timeout(DEFAULT_TIMEOUT),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl AiProvider for ReqwestAiProvider {
    async fn analyze(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest { model: &self.model, messages: vec![ChatMessage { role: "user", content: prompt }] };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::upstream(format!("AI provider request failed: {err}"), true))?;

        if !response.status().is_success() {
            let retryable = response.status().is_server_error();
            let status = response.status();
            return Err(AppError::upstream(format!("AI provider returned {status}"), retryable));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| AppError::upstream(format!("AI provider returned an unparsable body: {err}"), false))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::upstream("AI provider returned no choices", false))
    }
}
