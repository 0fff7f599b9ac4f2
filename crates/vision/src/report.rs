//! Multi-run analysis report

use std::fmt;

/// Separator placed between runs and between report sections
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Result of one image analysis
///
/// Rendering embeds the OCR text and every run twice: once in the individual
/// passes and once more in the merged section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisReport {
    /// OCR output (or captured OCR error); `None` when OCR was off
    pub ocr_text: Option<String>,

    /// Generated text per run, in run order
    pub runs: Vec<String>,
}

impl AnalysisReport {
    /// Create a report from finished runs
    pub fn new(ocr_text: Option<String>, runs: Vec<String>) -> Self {
        Self { ocr_text, runs }
    }

    /// OCR section, empty when there is no OCR text
    pub fn ocr_section(&self) -> String {
        match self.ocr_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => format!("## OCR Text\n{}\n", text),
            _ => String::new(),
        }
    }

    /// Labelled run sections joined by the separator
    pub fn run_sections(&self) -> String {
        self.runs
            .iter()
            .enumerate()
            .map(|(i, text)| format!("### Run {}\n{}", i + 1, text))
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR)
    }

    /// Merged view re-embedding the OCR section and all runs
    pub fn merged_section(&self) -> String {
        format!("## Merged Analysis\n{}{}", self.ocr_section(), self.run_sections())
    }

    /// Final display text
    pub fn render(&self) -> String {
        format!(
            "{}{}## Individual Passes\n{}{}{}",
            self.ocr_section(),
            SECTION_SEPARATOR,
            self.run_sections(),
            SECTION_SEPARATOR,
            self.merged_section()
        )
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
