use async_trait::async_trait;
use visionprobe_common::Result;

use crate::client::OllamaClient;
use crate::types::GenerateRequest;

/// Anything that turns one generate request into its full text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one request to completion
    async fn generate(&self, request: GenerateRequest) -> Result<String>;
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        OllamaClient::generate(self, request).await
    }
}
