use serde::{Deserialize, Serialize};

/// Text completion request
#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    /// Prompt text
    pub prompt: String,

    /// Ollama server URL (config default when absent)
    #[serde(default)]
    pub server_url: Option<String>,

    /// Model name (config default when absent)
    #[serde(default)]
    pub model: Option<String>,
}

/// Model pull request
#[derive(Debug, Deserialize)]
pub struct PullModelRequest {
    /// Model to pull (config default when absent)
    #[serde(default)]
    pub model: Option<String>,

    /// Ollama server URL (config default when absent)
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Display text for one operation, success or failure
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultResponse {
    /// Text to show in the result box
    pub result: String,

    /// Whether `result` is a success value
    pub ok: bool,
}

/// Defaults used to pre-fill the UI
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub server_url: String,
    pub model: String,
    pub default_runs: u32,
    pub min_runs: u32,
    pub max_runs: u32,
    pub ocr_available: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
