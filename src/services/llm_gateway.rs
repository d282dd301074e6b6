use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::errors::LlmError;

/// How much of a rejected reply body is kept for diagnostics
const REJECTED_BODY_MAX_CHARS: usize = 300;

/// Configuration for the LLM gateway
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub ollama_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            ollama_url: "http://localhost:11434/api/generate".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            max_concurrency: 1,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: std::env::var("LLM_PROVIDER").unwrap_or(defaults.provider),
            ollama_url: std::env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model: std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            max_concurrency: std::env::var("LLM_MAX_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_concurrency)
                .clamp(1, 8),
            timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Generative text capability. Both operations are single-shot; callers that
/// need resilience add their own retry policy.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Submit a prompt and return the model's raw text reply
    async fn generate(&self, prompt: String) -> Result<String, LlmError>;

    /// Summarize free text for a retail investor
    #[allow(dead_code)]
    async fn summarize(&self, text: String) -> Result<String, LlmError>;
}

/// Local Ollama-style model server backend
pub struct OllamaBackend {
    url: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaReply {
    response: Option<String>,
}

impl OllamaBackend {
    pub fn new(url: String, model: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { url, model, client }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, prompt: String) -> Result<String, LlmError> {
        info!("Sending prompt to Ollama (model: {}, {} chars)", self.model, prompt.len());

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let reply: OllamaReply = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        // Absent response field is treated as an empty reply
        Ok(reply.response.unwrap_or_default())
    }

    async fn summarize(&self, text: String) -> Result<String, LlmError> {
        let prompt = format!(
            "Суммаризируй следующий текст по-русски, кратко и ясно.\n\
             Формат:\n\
             - 3–5 буллетов с ключевыми фактами;\n\
             - 1–2 предложения выводов для инвестора.\n\n\
             Текст:\n{}",
            text
        );

        self.generate(prompt).await
    }
}

/// Hosted OpenAI-style API backend
pub struct OpenAiBackend {
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            model: "gpt-4o-mini".to_string(),
            client,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn generate(&self, prompt: String) -> Result<String, LlmError> {
        info!("Sending prompt to OpenAI (model: {}, {} chars)", self.model, prompt.len());

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: vec![OpenAiMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let reply: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }

    async fn summarize(&self, text: String) -> Result<String, LlmError> {
        let prompt = format!("Суммаризируй следующий текст:\n\n{}", text);
        self.generate(prompt).await
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(REJECTED_BODY_MAX_CHARS).collect()
}

/// Gateway in front of a generative backend. The semaphore is the single
/// process-wide coordination point for outbound LLM calls, shared by all
/// feed and chat requests; its lifecycle is tied to this instance. A call
/// that cannot take a slot fails with `LlmError::Busy` instead of queuing.
pub struct LlmGateway {
    backend: Arc<dyn LlmBackend>,
    slots: Arc<Semaphore>,
}

impl LlmGateway {
    pub fn new(backend: Arc<dyn LlmBackend>, slots: Arc<Semaphore>) -> Self {
        Self { backend, slots }
    }

    /// Build the gateway from config, selecting the backend by provider name
    pub fn from_config(config: &LlmConfig) -> Self {
        let backend: Arc<dyn LlmBackend> = match config.provider.as_str() {
            "openai" => {
                let api_key = config
                    .api_key
                    .clone()
                    .expect("OPENAI_API_KEY is required for the openai provider");
                info!("Using LLM provider: OpenAI");
                Arc::new(OpenAiBackend::new(api_key, config.timeout_secs))
            }
            "ollama" => {
                info!("Using LLM provider: Ollama at {}", config.ollama_url);
                Arc::new(OllamaBackend::new(
                    config.ollama_url.clone(),
                    config.model.clone(),
                    config.timeout_secs,
                ))
            }
            other => {
                panic!("Invalid LLM_PROVIDER: {}. Must be 'ollama' or 'openai'", other);
            }
        };

        let slots = Arc::new(Semaphore::new(config.max_concurrency));
        Self::new(backend, slots)
    }

    pub async fn generate(&self, prompt: String) -> Result<String, LlmError> {
        let _permit = self.slots.try_acquire().map_err(|_| {
            warn!("LLM gateway busy, rejecting call");
            LlmError::Busy
        })?;

        self.backend.generate(prompt).await
    }

    #[allow(dead_code)]
    pub async fn summarize(&self, text: String) -> Result<String, LlmError> {
        let _permit = self.slots.try_acquire().map_err(|_| {
            warn!("LLM gateway busy, rejecting call");
            LlmError::Busy
        })?;

        self.backend.summarize(text).await
    }

    #[allow(dead_code)]
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Duration};

    struct SlowBackend {
        calls: AtomicUsize,
        delay_ms: u64,
    }

    #[async_trait]
    impl LlmBackend for SlowBackend {
        async fn generate(&self, _prompt: String) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(self.delay_ms)).await;
            Ok("ответ".to_string())
        }

        async fn summarize(&self, text: String) -> Result<String, LlmError> {
            self.generate(text).await
        }
    }

    fn gateway_with(delay_ms: u64, slots: usize) -> Arc<LlmGateway> {
        let backend = Arc::new(SlowBackend {
            calls: AtomicUsize::new(0),
            delay_ms,
        });
        Arc::new(LlmGateway::new(backend, Arc::new(Semaphore::new(slots))))
    }

    #[test]
    fn ollama_request_serializes_model_prompt_nonstreaming() {
        let request = OllamaRequest {
            model: "llama3.2".to_string(),
            prompt: "Проанализируй текст".to_string(),
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["prompt"], "Проанализируй текст");
        assert_eq!(json["stream"], false);
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn ollama_reply_response_field_may_be_absent() {
        let reply: OllamaReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.response.unwrap_or_default(), "");

        let reply: OllamaReply = serde_json::from_str(r#"{"response": "ответ"}"#).unwrap();
        assert_eq!(reply.response.as_deref(), Some("ответ"));
    }

    #[test]
    fn config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.timeout_secs, 120);
    }

    #[tokio::test]
    async fn second_simultaneous_call_fails_busy() {
        let gateway = gateway_with(200, 1);

        let first = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.generate("первый".to_string()).await })
        };

        // Let the first call take the only slot
        sleep(Duration::from_millis(50)).await;

        let second = gateway.generate("второй".to_string()).await;
        assert!(matches!(second, Err(LlmError::Busy)));

        let first = first.await.unwrap();
        assert_eq!(first.unwrap(), "ответ");
    }

    #[tokio::test]
    async fn slot_is_released_after_completion() {
        let gateway = gateway_with(0, 1);

        assert!(gateway.generate("раз".to_string()).await.is_ok());
        assert!(gateway.generate("два".to_string()).await.is_ok());
        assert_eq!(gateway.available_slots(), 1);
    }

    #[tokio::test]
    async fn parallel_calls_fit_within_ceiling() {
        let gateway = gateway_with(100, 2);

        let a = {
            let g = gateway.clone();
            tokio::spawn(async move { g.generate("a".to_string()).await })
        };
        let b = {
            let g = gateway.clone();
            tokio::spawn(async move { g.generate("b".to_string()).await })
        };

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
    }
}
