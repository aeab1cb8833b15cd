//! Remote completion HTTP client using reqwest.
//!
//! Talks to a Groq (OpenAI-compatible) chat-completions endpoint. Single
//! blocking request/response per call — no retry, no streaming, transport
//! defaults for timeouts. Any transport error, non-2xx status, or malformed
//! body is logged and collapsed into [`SENTINEL`], which the orchestrator
//! detects as the trigger for the local fallback.

use serde::Deserialize;
use serde_json::json;

use crate::config::{Config, TEMPERATURE};
use crate::error::MedAssistantError;

/// In-band failure signal returned instead of generated text.
pub const SENTINEL: &str = "Sorry, I encountered an issue reaching the medical model.";

/// Fixed persona and output-formatting rules sent as the system message.
pub const SYSTEM_PROMPT: &str = "\
You are a knowledgeable and empathetic medical assistant AI. \
Always tailor your response specifically to the user's described condition. \
Do NOT repeat generic content for different symptoms — instead, diagnose the user's concern with precision.\n\n\
Your output MUST:\n\
- Start with a brief empathetic acknowledgement.\n\
- Clearly list potential causes related only to the user input.\n\
- Use <ul> and <li> tags for bullet lists.\n\
- Use <strong> to highlight symptom names, diagnosis, or conditions.\n\
- Avoid repeating the same recommendations unless truly applicable.\n\
- Give actionable and relevant suggestions.\n\
- Include a disclaimer reminding users to consult professionals.\n\
- Do NOT include markdown or code formatting.\n\
- Do NOT answer with vague or identical responses for different symptoms.\n";

/// Seam for the orchestrator: lets tests substitute a canned backend
/// without any network access.
pub trait CompletionBackend {
    /// Send `prompt` and return the generated text, or [`SENTINEL`] on failure.
    fn complete(&self, prompt: &str) -> impl std::future::Future<Output = String> + Send;
}

/// HTTP client for the Groq chat-completions API.
pub struct GroqClient {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    model: String,
}

impl GroqClient {
    /// Create a client from `config` with default reqwest settings.
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: format!("{}/openai/v1/chat/completions", config.api_base_url),
            api_token: config.api_token.clone(),
            model: config.model.clone(),
        }
    }

    // ── Private helpers ──────────────────────────────────────────────────────

    /// Build the JSON request body: system + user message, fixed temperature.
    fn build_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": TEMPERATURE
        })
    }

    /// Execute the POST request and surface structured errors.
    async fn try_complete(&self, prompt: &str) -> Result<String, MedAssistantError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&self.build_body(prompt))
            .send()
            .await
            .map_err(MedAssistantError::Http)?;

        let status = response.status();
        if !status.is_success() {
            // Read body for diagnostics before consuming the response.
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "(unreadable body)".to_string());
            return Err(map_http_error(status.as_u16(), &error_body));
        }

        let raw = response
            .json::<serde_json::Value>()
            .await
            .map_err(MedAssistantError::Http)?;

        parse_content(&raw)
    }
}

impl CompletionBackend for GroqClient {
    async fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Error calling completion API: {}", e);
                SENTINEL.to_string()
            }
        }
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

/// Subset of the chat-completions response body this client consumes.
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Extract `choices[0].message.content` from a chat-completions response body.
pub fn parse_content(raw: &serde_json::Value) -> Result<String, MedAssistantError> {
    let parsed: ChatCompletion = serde_json::from_value(raw.clone())
        .map_err(|e| MedAssistantError::Completion(format!("malformed response body: {e}")))?;

    parsed
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .ok_or_else(|| MedAssistantError::Completion("response body has no choices".to_string()))
}

// ── HTTP error mapping ────────────────────────────────────────────────────────

/// Maximum number of bytes from an HTTP error body included in error messages.
/// Prevents large or potentially sensitive server responses from propagating
/// verbatim through error chains and log sinks.
const MAX_ERROR_BODY_LEN: usize = 200;

fn map_http_error(status: u16, body: &str) -> MedAssistantError {
    // Truncate raw body to avoid leaking large or sensitive API error payloads.
    // Use char-based truncation to avoid panicking at a multi-byte UTF-8 boundary.
    let safe_body = if body.chars().count() > MAX_ERROR_BODY_LEN {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{truncated}…[truncated]")
    } else {
        body.to_string()
    };

    match status {
        401 => MedAssistantError::Completion("Unauthorized: check API_TOKEN".to_string()),
        429 => MedAssistantError::Completion("Rate limited by completion API".to_string()),
        s if s >= 500 => {
            MedAssistantError::Completion(format!("Completion server error {s}: {safe_body}"))
        }
        s => MedAssistantError::Completion(format!("HTTP {s}: {safe_body}")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
