//! OCR via the Tesseract command-line tool

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};
use visionprobe_common::{ProbeError, Result};

/// Extracts printable text from an image file
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image: &Path) -> Result<String>;
}

/// Tesseract CLI wrapper
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    /// Create a wrapper around `binary` using the given language pack
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Whether the binary can be launched at all
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn extract_text(&self, image: &Path) -> Result<String> {
        info!("Running OCR on {} with {}", image.display(), self.binary);

        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| {
                ProbeError::ocr(format!(
                    "Failed to run {}: {}. Make sure Tesseract is installed.",
                    self.binary, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::ocr(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Run OCR and fold any failure into the returned text
///
/// OCR problems must never stop an image analysis, so the error message is
/// embedded in the report instead of being propagated.
pub async fn capture_ocr_text<O: OcrEngine + ?Sized>(engine: &O, image: &Path) -> String {
    match engine.extract_text(image).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("OCR failed for {}: {}", image.display(), e);
            if matches!(e, ProbeError::Ocr(_)) {
                e.to_string()
            } else {
                format!("OCR Error: {}", e)
            }
        }
    }
}
