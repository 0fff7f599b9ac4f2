use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default Ollama API base URL
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default vision model
pub const DEFAULT_MODEL: &str = "hf.co/leafspark/Llama-3.2-11B-Vision-Instruct-GGUF:Q8_0";

/// Default UI server port
pub const DEFAULT_PORT: u16 = 7634;

/// Smallest and largest number of analysis runs the UI allows
pub const MIN_RUNS: u32 = 1;
pub const MAX_RUNS: u32 = 10;

/// VisionProbe application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Model name used when the UI does not supply one
    pub model: String,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Tesseract binary name or path
    pub tesseract_path: String,

    /// Tesseract language pack
    pub ocr_language: String,

    /// Number of analysis runs when none is given
    pub default_runs: u32,

    /// Optional `max_tokens` sent with every generate request
    pub max_tokens: Option<u32>,

    /// Replacement for the built-in image analysis prompt
    pub analysis_prompt: Option<String>,

    /// Whole-request timeout in seconds. `None` leaves the transport default
    /// in place, which never times out.
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: DEFAULT_PORT,
            log_dir: PathBuf::from("./log"),
            log_level: "info".to_string(),
            tesseract_path: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            default_runs: 2,
            max_tokens: None,
            analysis_prompt: None,
            request_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, ProbeError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let config = Self {
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| detect_hostname()),
            server_port: Self::get_env_parsed("SERVER_PORT").unwrap_or(DEFAULT_PORT),
            log_dir: std::env::var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./log")),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            tesseract_path: std::env::var("TESSERACT_PATH")
                .unwrap_or_else(|_| "tesseract".to_string()),
            ocr_language: std::env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string()),
            default_runs: Self::get_env_parsed("DEFAULT_RUNS").unwrap_or(2),
            max_tokens: Self::get_env_parsed("MAX_TOKENS"),
            analysis_prompt: std::env::var("ANALYSIS_PROMPT")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            request_timeout_secs: Self::get_env_parsed("REQUEST_TIMEOUT_SECS"),
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse an environment variable, ignoring unset or unparsable values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }

    /// Whole-request timeout, if one is configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.model.trim().is_empty() {
            return Err(ProbeError::config("Model name cannot be empty"));
        }

        validate_base_url(&self.ollama_base_url)?;

        if self.server_port == 0 {
            return Err(ProbeError::config("Server port cannot be 0"));
        }

        if !(MIN_RUNS..=MAX_RUNS).contains(&self.default_runs) {
            return Err(ProbeError::config(format!(
                "Default runs must be between {} and {}, got {}",
                MIN_RUNS, MAX_RUNS, self.default_runs
            )));
        }

        Ok(())
    }
}

/// Check that a user-supplied server URL has an http(s) scheme
pub fn validate_base_url(url: &str) -> Result<(), ProbeError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ProbeError::config(
            "Ollama base URL must start with http:// or https://",
        ));
    }
    Ok(())
}

/// Local machine hostname, used as the default bind address
pub fn detect_hostname() -> String {
    #[cfg(target_os = "windows")]
    {
        if let Ok(name) = std::env::var("COMPUTERNAME") {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(name) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }

        if let Ok(output) = std::process::Command::new("hostname").output() {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if output.status.success() && !name.is_empty() {
                return name;
            }
        }
    }

    // Fallback
    "127.0.0.1".to_string()
}
