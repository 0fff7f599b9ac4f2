//! Image input handling

use std::path::{Path, PathBuf};
use tracing::debug;
use visionprobe_common::{ProbeError, Result};

/// Supported image file extensions
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp",
];

/// Check if file extension is supported
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// An image on disk together with its raw bytes
///
/// The path is kept because the OCR engine reads the file itself; the bytes
/// are what gets base64-encoded into generate requests.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Location of the image file
    pub path: PathBuf,

    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl ImageInput {
    /// Read an image file
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !is_supported_image(&path) {
            return Err(ProbeError::invalid_input(format!(
                "Unsupported image type: {} (expected one of: {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            ProbeError::invalid_input(format!("Failed to read image {}: {}", path.display(), e))
        })?;

        Self::from_parts(path, bytes)
    }

    /// Wrap bytes that are already in memory and stored at `path`
    pub fn from_parts(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        let path = path.into();
        if bytes.is_empty() {
            return Err(ProbeError::invalid_input(format!(
                "Image is empty: {}",
                path.display()
            )));
        }

        debug!("Image ready: {} ({} bytes)", path.display(), bytes.len());
        Ok(Self { path, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.JPG")));
        assert!(is_supported_image(Path::new("scan.tiff")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn test_from_parts_rejects_empty() {
        assert!(ImageInput::from_parts("a.png", Vec::new()).is_err());
        assert!(ImageInput::from_parts("a.png", vec![1, 2, 3]).is_ok());
    }

    #[tokio::test]
    async fn test_load_reads_bytes() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let image = ImageInput::load(file.path()).await.unwrap();
        assert_eq!(image.bytes, b"\x89PNG fake");
        assert_eq!(image.path, file.path());
    }

    #[tokio::test]
    async fn test_load_rejects_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = ImageInput::load(file.path()).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = ImageInput::load("/definitely/not/here.png").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read image"));
    }
}
