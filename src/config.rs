//! Configuration loading from environment variables via dotenvy.
//! No values are ever hardcoded here.

use crate::error::MedAssistantError;

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the completion API — sourced from `API_TOKEN`
    pub api_token: String,
    /// Base URL for the completion API — sourced from `CHAT_API_BASE_URL`
    pub api_base_url: String,
    /// Completion model identifier — sourced from `CHAT_MODEL`
    pub model: String,
    /// Path to the reference medical term list — sourced from `MEDICAL_TERMS_PATH`
    pub terms_path: String,
    /// Path to the local ONNX embedding model — sourced from `EMBEDDING_MODEL_PATH`
    pub embedding_model_path: String,
}

/// Load configuration purely from already-set environment variables.
///
/// Does **not** call `dotenvy::dotenv()` — useful in tests that need to
/// control the env precisely via [`std::env::set_var`] / [`std::env::remove_var`].
///
/// # Errors
/// Returns [`MedAssistantError::Config`] if required variables are missing or invalid.
pub fn load_config_from_env() -> Result<Config, MedAssistantError> {
    let api_token = std::env::var("API_TOKEN")
        .map_err(|_| MedAssistantError::Config("API_TOKEN not set".to_string()))?;

    if api_token.is_empty() {
        return Err(MedAssistantError::Config("API_TOKEN is empty".to_string()));
    }

    let api_base_url = std::env::var("CHAT_API_BASE_URL")
        .unwrap_or_else(|_| "https://api.groq.com".to_string());

    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(MedAssistantError::Config(
            "CHAT_API_BASE_URL must start with http:// or https://".to_string(),
        ));
    }

    // SECURITY: warn when a plaintext HTTP endpoint is configured.
    // The bearer token travels in the `Authorization` header, which would be
    // exposed in cleartext on http:// connections. Only acceptable on
    // localhost for local-proxy development setups.
    if api_base_url.starts_with("http://") {
        eprintln!(
            "WARNING: CHAT_API_BASE_URL uses plaintext http://. \
             The API token will be transmitted without TLS encryption. \
             Set CHAT_API_BASE_URL=https://api.groq.com for production."
        );
    }

    let model =
        std::env::var("CHAT_MODEL").unwrap_or_else(|_| "llama3-70b-8192".to_string());

    let terms_path =
        std::env::var("MEDICAL_TERMS_PATH").unwrap_or_else(|_| "medical_terms.txt".to_string());

    let embedding_model_path = std::env::var("EMBEDDING_MODEL_PATH")
        .unwrap_or_else(|_| "./models/paraphrase-multilingual-MiniLM-L12-v2".to_string());

    Ok(Config {
        api_token,
        api_base_url,
        model,
        terms_path,
        embedding_model_path,
    })
}

/// Load configuration from the environment (`.env` + system env vars).
///
/// Loads `.env` via `dotenvy` first (ignoring errors if the file is absent),
/// then delegates to [`load_config_from_env`].
///
/// # Errors
/// Returns [`MedAssistantError::Config`] if required variables are missing or invalid.
pub fn load_config() -> Result<Config, MedAssistantError> {
    // Load .env if present; ignore the error — variables may already be set externally.
    let _ = dotenvy::dotenv();
    load_config_from_env()
}

// ── Component thresholds ───────────────────────────────────────────────────

/// Minimum cosine similarity for an input to count as domain-relevant.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Number of user/assistant turn pairs retained in the conversation window.
pub const DEFAULT_MAX_TURNS: usize = 5;

/// Sampling temperature sent with every completion request.
pub const TEMPERATURE: f64 = 0.7;
