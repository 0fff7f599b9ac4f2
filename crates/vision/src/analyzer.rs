use tracing::{debug, info, warn};
use visionprobe_common::{ProbeError, Result, MAX_RUNS, MIN_RUNS};
use visionprobe_llm::{GenerateRequest, TextGenerator, VISUAL_BREAKDOWN_PROMPT};

use crate::image::ImageInput;
use crate::ocr::{capture_ocr_text, OcrEngine};
use crate::report::AnalysisReport;

/// Number of analysis runs, always within 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCount(u32);

impl RunCount {
    /// Validate a requested run count
    pub fn new(runs: u32) -> Result<Self> {
        if !(MIN_RUNS..=MAX_RUNS).contains(&runs) {
            return Err(ProbeError::invalid_input(format!(
                "Number of runs must be between {} and {}, got {}",
                MIN_RUNS, MAX_RUNS, runs
            )));
        }
        Ok(Self(runs))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for RunCount {
    fn default() -> Self {
        Self(2)
    }
}

/// Per-invocation analysis settings
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Model to run
    pub model: String,

    /// How many times to sample the same prompt
    pub runs: RunCount,

    /// Prepend OCR output to the report
    pub ocr: bool,

    /// Optional token limit per run
    pub max_tokens: Option<u32>,
}

impl AnalysisOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            runs: RunCount::default(),
            ocr: false,
            max_tokens: None,
        }
    }
}

/// Samples one image prompt several times and assembles the report
pub struct MultiRunAnalyzer<G, O> {
    generator: G,
    ocr: O,
    prompt: String,
}

impl<G, O> MultiRunAnalyzer<G, O>
where
    G: TextGenerator,
    O: OcrEngine,
{
    /// Create analyzer using the default visual breakdown prompt
    pub fn new(generator: G, ocr: O) -> Self {
        Self {
            generator,
            ocr,
            prompt: VISUAL_BREAKDOWN_PROMPT.to_string(),
        }
    }

    /// Replace the analysis prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Run the analysis
    ///
    /// Runs execute one after another so `Run 1` always precedes `Run 2`.
    /// The first failing run is returned as the error and every run that
    /// already succeeded is dropped. OCR failures never fail the analysis.
    pub async fn analyze(&self, image: &ImageInput, options: &AnalysisOptions) -> Result<AnalysisReport> {
        let runs = options.runs.get();
        info!(
            "Starting image analysis - Image: {}, Runs: {}, OCR: {}, Model: {}",
            image.path.display(),
            runs,
            options.ocr,
            options.model
        );

        let ocr_text = if options.ocr {
            Some(capture_ocr_text(&self.ocr, &image.path).await)
        } else {
            None
        };

        let mut results = Vec::with_capacity(runs as usize);
        for i in 0..runs {
            debug!("Analysis run {}/{}", i + 1, runs);

            let request = GenerateRequest::vision(&options.model, &self.prompt, &image.bytes)
                .with_max_tokens(options.max_tokens);

            match self.generator.generate(request).await {
                Ok(text) => results.push(text),
                Err(e) => {
                    warn!(
                        "Analysis run {}/{} failed, discarding {} completed runs: {}",
                        i + 1,
                        runs,
                        results.len(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        info!("Image analysis finished - {} runs", results.len());
        Ok(AnalysisReport::new(ocr_text, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;
    use visionprobe_common::Operation;

    /// Hands out canned results in order and records the requests it saw
    struct ScriptedGenerator {
        results: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedGenerator {
        fn new(results: Vec<Result<String>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, request: GenerateRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            let next = self.results.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(String::new()))
        }
    }

    struct FixedOcr(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn extract_text(&self, _image: &Path) -> Result<String> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(msg) => Err(ProbeError::ocr(msg)),
            }
        }
    }

    fn image() -> ImageInput {
        ImageInput::from_parts("street.png", b"png-bytes".to_vec()).unwrap()
    }

    fn options(runs: u32, ocr: bool) -> AnalysisOptions {
        AnalysisOptions {
            runs: RunCount::new(runs).unwrap(),
            ocr,
            ..AnalysisOptions::new("llava")
        }
    }

    #[test]
    fn test_run_count_bounds() {
        assert!(RunCount::new(0).is_err());
        assert!(RunCount::new(11).is_err());
        assert_eq!(RunCount::new(10).unwrap().get(), 10);
        assert_eq!(RunCount::default().get(), 2);
    }

    #[tokio::test]
    async fn test_runs_are_labelled_in_order() {
        let generator = ScriptedGenerator::new(vec![Ok("A".into()), Ok("B".into()), Ok("C".into())]);
        let analyzer = MultiRunAnalyzer::new(generator, FixedOcr(Ok("unused")));

        let report = analyzer.analyze(&image(), &options(3, false)).await.unwrap();
        assert_eq!(report.runs, vec!["A", "B", "C"]);
        assert!(report.ocr_text.is_none());

        let rendered = report.render();
        let run1 = rendered.find("### Run 1\nA").unwrap();
        let run2 = rendered.find("### Run 2\nB").unwrap();
        let run3 = rendered.find("### Run 3\nC").unwrap();
        assert!(run1 < run2 && run2 < run3);
    }

    #[tokio::test]
    async fn test_failed_run_discards_earlier_runs() {
        let generator = ScriptedGenerator::new(vec![
            Ok("first pass".into()),
            Err(ProbeError::status(500, "model crashed", Operation::Generate)),
        ]);
        let analyzer = MultiRunAnalyzer::new(generator, FixedOcr(Ok("")));

        let err = analyzer.analyze(&image(), &options(2, false)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Server returned status code 500. Response content: model crashed"
        );
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_runs() {
        let generator = ScriptedGenerator::new(vec![
            Err(ProbeError::network("connection refused")),
            Ok("never".into()),
        ]);
        let analyzer = MultiRunAnalyzer::new(generator, FixedOcr(Ok("")));

        assert!(analyzer.analyze(&image(), &options(3, false)).await.is_err());
        assert_eq!(analyzer.generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_every_run_sends_same_image_and_prompt() {
        let generator = ScriptedGenerator::new(vec![Ok("x".into()), Ok("y".into())]);
        let analyzer = MultiRunAnalyzer::new(generator, FixedOcr(Ok(""))).with_prompt("What is this?");

        analyzer.analyze(&image(), &options(2, false)).await.unwrap();

        let requests = analyzer.generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for request in requests.iter() {
            assert_eq!(request.model, "llava");
            assert_eq!(request.prompt, "What is this?");
            assert_eq!(request.images.as_deref(), Some(&["cG5nLWJ5dGVz".to_string()][..]));
            assert!(request.stream);
        }
    }

    #[tokio::test]
    async fn test_ocr_text_prepended() {
        let generator = ScriptedGenerator::new(vec![Ok("a sign".into())]);
        let analyzer = MultiRunAnalyzer::new(generator, FixedOcr(Ok("ONE WAY\n")));

        let report = analyzer.analyze(&image(), &options(1, true)).await.unwrap();
        assert_eq!(report.ocr_text.as_deref(), Some("ONE WAY"));
        assert!(report.render().starts_with("## OCR Text\nONE WAY\n"));
    }

    #[tokio::test]
    async fn test_ocr_failure_does_not_abort() {
        let generator = ScriptedGenerator::new(vec![Ok("still analyzed".into())]);
        let analyzer = MultiRunAnalyzer::new(generator, FixedOcr(Err("tesseract missing")));

        let report = analyzer.analyze(&image(), &options(1, true)).await.unwrap();
        assert_eq!(report.ocr_text.as_deref(), Some("OCR Error: tesseract missing"));
        assert!(report.render().contains("### Run 1\nstill analyzed"));
    }
}
