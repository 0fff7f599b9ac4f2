//! VisionProbe image analysis
//!
//! Image loading, Tesseract OCR and the multi-run analysis report

pub mod analyzer;
pub mod image;
pub mod ocr;
pub mod report;

// Re-export main types
pub use analyzer::{AnalysisOptions, MultiRunAnalyzer, RunCount};
pub use image::{is_supported_image, ImageInput, SUPPORTED_EXTENSIONS};
pub use ocr::{capture_ocr_text, OcrEngine, TesseractOcr};
pub use report::{AnalysisReport, SECTION_SEPARATOR};
