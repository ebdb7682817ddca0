//! Line translation gateway.
//!
//! [`TranslationGateway`] is the capability the pipeline drives: one line in,
//! one line out, no session state. Retries and rate-limit delays are pipeline
//! policy and do not belong here. [`ChatGateway`] implements it against an
//! OpenAI-compatible chat completions endpoint.

use crate::config::{ApiConfig, PromptsConfig};
use crate::error::TranslationError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

/// Refusal phrases that indicate the model declined to translate.
static REFUSAL_PHRASES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "i'm sorry",
        "i cannot",
        "i am unable",
        "as an ai",
        "my apologies",
        "i am not programmed",
        "i do not have the ability",
    ]
});

/// Regex to extract text from markdown code fences.
static CODE_FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("Invalid CODE_FENCE_REGEX")
});

/// Regex matching a line break and the whitespace around it.
static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\r\n]+\s*").expect("Invalid LINE_BREAK_REGEX"));

/// Translates single lines of text between two language codes.
#[async_trait]
pub trait TranslationGateway: Send + Sync {
    /// Returns the human-readable name of this gateway.
    fn name(&self) -> &'static str;

    /// Translates one non-blank line.
    async fn translate_line(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslationError>;
}

/// A message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Content of the message.
    pub content: String,
}

/// Request body for the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

/// Response from the chat completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// A single choice in the response.
#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Message content in a response.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Gateway backed by an OpenAI-compatible chat completions API.
pub struct ChatGateway {
    /// HTTP client for API requests.
    client: Client,
    /// API configuration.
    api_config: ApiConfig,
    /// System prompt template with `{source}`/`{target}` placeholders.
    prompt_template: String,
}

impl ChatGateway {
    /// Create a new ChatGateway.
    ///
    /// The configured timeout bounds every request, so a hanging call
    /// surfaces as a line failure instead of stalling the run.
    pub fn new(api_config: ApiConfig, prompts: &PromptsConfig) -> Result<Self, TranslationError> {
        if !api_config.is_configured() {
            return Err(TranslationError::InvalidConfig(
                "API key is not configured".to_string(),
            ));
        }

        let timeout = Duration::try_from_secs_f64(api_config.timeout_sec)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| {
                TranslationError::InvalidConfig(format!(
                    "api.timeout_sec must be a positive number of seconds, got {}",
                    api_config.timeout_sec
                ))
            })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_config,
            prompt_template: prompts.line_translation.clone(),
        })
    }

    /// Builds the system prompt for a language pair.
    fn system_prompt(&self, source_lang: &str, target_lang: &str) -> String {
        self.prompt_template
            .replace("{source}", source_lang)
            .replace("{target}", target_lang)
    }

    /// Endpoint URL for chat completions.
    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.api_config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TranslationGateway for ChatGateway {
    fn name(&self) -> &'static str {
        "OpenAI-compatible chat"
    }

    async fn translate_line(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslationError> {
        let request = ChatRequest {
            model: self.api_config.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.system_prompt(source_lang, target_lang),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_config.key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| TranslationError::ParseError(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TranslationError::ParseError("response has no choices".to_string()))?;

        clean_response(&content)
    }
}

/// Normalizes a model reply into a single translated line.
///
/// Strips code fences, collapses line breaks to a single space, and rejects
/// empty replies and refusals.
pub fn clean_response(raw: &str) -> Result<String, TranslationError> {
    let trimmed = raw.trim();
    let unfenced = CODE_FENCE_REGEX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());
    let line = LINE_BREAK_REGEX.replace_all(unfenced.trim(), " ").into_owned();

    if line.is_empty() {
        return Err(TranslationError::EmptyResponse);
    }

    let lower = line.to_lowercase();
    if let Some(phrase) = REFUSAL_PHRASES.iter().find(|p| lower.starts_with(*p)) {
        return Err(TranslationError::Refused(format!(
            "Response starts with refusal phrase: {}",
            phrase
        )));
    }

    Ok(line)
}
