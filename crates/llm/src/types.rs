use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use visionprobe_common::{ProbeError, Result};

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model name (e.g., "llava", "llama3.2-vision")
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Base64-encoded images, only for vision requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    /// Always true; there is no non-streaming code path
    pub stream: bool,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    /// Text-only request
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            images: None,
            stream: true,
            max_tokens: None,
        }
    }

    /// Vision request carrying one image; the raw bytes are base64-encoded here
    pub fn vision(model: impl Into<String>, prompt: impl Into<String>, image: &[u8]) -> Self {
        Self {
            images: Some(vec![STANDARD.encode(image)]),
            ..Self::text(model, prompt)
        }
    }

    /// Set the token limit
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Reject empty model or prompt before anything goes on the wire
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ProbeError::invalid_input("Model name cannot be empty"));
        }
        if self.prompt.trim().is_empty() {
            return Err(ProbeError::invalid_input("Prompt cannot be empty"));
        }
        Ok(())
    }
}

/// Ollama pull request
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    /// Model to fetch on the server
    pub name: String,
}
