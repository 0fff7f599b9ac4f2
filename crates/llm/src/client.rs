use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use visionprobe_common::{Operation, ProbeError, Result, StreamField};

use crate::stream::{collect_stream, FragmentJoin};
use crate::types::{GenerateRequest, PullRequest};

/// Ollama API client
///
/// Each call is a single POST whose streamed JSON Lines body is read to the
/// end before returning. There is no retry.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client with the transport's default (unbounded) timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Create new Ollama client with an optional whole-request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.into();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        debug!("Ollama client initialized: {} (timeout: {:?})", base_url, timeout);
        Ok(Self { base_url, client })
    }

    /// Same transport, different server
    pub fn for_base_url(&self, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: self.client.clone(),
        }
    }

    /// Server base URL as given, without normalization
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate text and return the concatenated `response` fragments
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        self.generate_with_progress(request, |_| {}).await
    }

    /// Generate text, handing each fragment to `on_fragment` as it arrives
    pub async fn generate_with_progress<F>(&self, request: GenerateRequest, on_fragment: F) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        request.validate()?;

        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            stream: true,
            ..request
        };

        info!(
            "Sending generate request - Model: {}, Prompt length: {}, Images: {}",
            request.model,
            request.prompt.len(),
            request.images.as_ref().map_or(0, Vec::len)
        );

        let response = self.post_json(&url, &request).await?;
        let response = check_status(response, Operation::Generate).await?;

        let text = collect_stream(
            response.bytes_stream(),
            StreamField::Response,
            FragmentJoin::Concatenate,
            on_fragment,
        )
        .await?;

        info!("Generation finished - Length: {}", text.len());
        Ok(text)
    }

    /// Plain text completion, no image
    pub async fn complete(&self, model: &str, prompt: &str, max_tokens: Option<u32>) -> Result<String> {
        self.generate(GenerateRequest::text(model, prompt).with_max_tokens(max_tokens))
            .await
    }

    /// Ask the server to fetch a model; returns the newline-terminated status log
    pub async fn pull(&self, model: &str) -> Result<String> {
        self.pull_with_progress(model, |_| {}).await
    }

    /// Pull a model, handing each status line to `on_status` as it arrives
    pub async fn pull_with_progress<F>(&self, model: &str, on_status: F) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        if model.trim().is_empty() {
            return Err(ProbeError::invalid_input("Model name cannot be empty"));
        }

        let url = format!("{}/api/pull", self.base_url);
        let request = PullRequest {
            name: model.to_string(),
        };

        info!("Pulling model: {}", model);

        let response = self.post_json(&url, &request).await?;
        let response = check_status(response, Operation::Pull).await?;

        let log = collect_stream(
            response.bytes_stream(),
            StreamField::Status,
            FragmentJoin::Lines,
            on_status,
        )
        .await?;

        info!("Pull finished for {} - {} status lines", model, log.lines().count());
        Ok(log)
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<reqwest::Response> {
        self.client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", url, e);
                ProbeError::network(format!("Failed to send request to {}: {}", url, e))
            })
    }
}

/// Turn anything but 200 into `NonSuccessStatus` carrying the raw body
async fn check_status(response: reqwest::Response, operation: Operation) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read error body for status {}: {}", status.as_u16(), e);
            String::new()
        }
    };
    warn!("Server returned {} for {:?}: {}", status.as_u16(), operation, body);
    Err(ProbeError::status(status.as_u16(), body, operation))
}
