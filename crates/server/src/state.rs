use visionprobe_common::{validate_base_url, AppConfig, Result};
use visionprobe_llm::{OllamaClient, VISUAL_BREAKDOWN_PROMPT};
use visionprobe_vision::{MultiRunAnalyzer, TesseractOcr};

/// Shared application state
///
/// Read-only after startup; every request builds its own client for the
/// server URL it was given.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Client for the configured default server
    pub client: OllamaClient,

    /// OCR engine
    pub ocr: TesseractOcr,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = OllamaClient::with_timeout(&config.ollama_base_url, config.request_timeout())?;
        let ocr = TesseractOcr::new(&config.tesseract_path, &config.ocr_language);

        Ok(Self { config, client, ocr })
    }

    /// Resolve the server URL a request asked for, falling back to the default
    pub fn resolve_base_url(&self, requested: Option<&str>) -> Result<String> {
        match requested.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => {
                validate_base_url(url)?;
                Ok(url.to_string())
            }
            None => Ok(self.config.ollama_base_url.clone()),
        }
    }

    /// Resolve the model a request asked for, falling back to the default
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(&self.config.model)
            .to_string()
    }

    /// Client pointed at `base_url`, sharing the connection pool
    pub fn client_for(&self, base_url: &str) -> OllamaClient {
        self.client.for_base_url(base_url)
    }

    /// Analyzer pointed at `base_url`
    pub fn analyzer_for(&self, base_url: &str) -> MultiRunAnalyzer<OllamaClient, TesseractOcr> {
        let prompt = self
            .config
            .analysis_prompt
            .as_deref()
            .unwrap_or(VISUAL_BREAKDOWN_PROMPT);

        MultiRunAnalyzer::new(self.client_for(base_url), self.ocr.clone()).with_prompt(prompt)
    }
}
