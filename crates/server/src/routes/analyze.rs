use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures::StreamExt;
use std::io::Write;
use tracing::{info, warn};
use visionprobe_common::{ProbeError, Result};
use visionprobe_vision::{is_supported_image, AnalysisOptions, ImageInput, RunCount};

use crate::state::AppState;
use crate::types::ResultResponse;

/// Largest accepted upload
const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Form fields of an analysis request
#[derive(Debug, Default)]
struct AnalyzeForm {
    image_name: Option<String>,
    image: Vec<u8>,
    runs: Option<String>,
    ocr: bool,
    server_url: Option<String>,
    model: Option<String>,
}

/// Checkbox-style values a browser may send
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

fn field_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim().to_string()
}

async fn read_form(mut payload: Multipart) -> actix_web::Result<AnalyzeForm> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = payload.next().await {
        let mut field = field?;
        let content_disposition = field.content_disposition();
        let name = content_disposition.get_name().unwrap_or("").to_string();
        let filename = content_disposition.get_filename().map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if data.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(actix_web::error::ErrorPayloadTooLarge(format!(
                    "Upload exceeds {} bytes",
                    MAX_IMAGE_BYTES
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "image" => {
                form.image_name = filename;
                form.image = data;
            }
            "runs" => form.runs = Some(field_text(&data)),
            "ocr" => form.ocr = parse_flag(&field_text(&data)),
            "server_url" => form.server_url = Some(field_text(&data)),
            "model" => form.model = Some(field_text(&data)),
            other => warn!("Ignoring unknown form field: {}", other),
        }
    }

    Ok(form)
}

/// Persist the upload so the OCR engine can read it from disk
fn stage_image(form: &AnalyzeForm) -> Result<(tempfile::NamedTempFile, ImageInput)> {
    let name = form.image_name.as_deref().unwrap_or("upload.png");
    if !is_supported_image(std::path::Path::new(name)) {
        return Err(ProbeError::invalid_input(format!("Unsupported image type: {}", name)));
    }

    let extension = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");

    let mut file = tempfile::Builder::new()
        .prefix("visionprobe-")
        .suffix(&format!(".{}", extension))
        .tempfile()?;
    file.write_all(&form.image)?;
    file.flush()?;

    let image = ImageInput::from_parts(file.path(), form.image.clone())?;
    Ok((file, image))
}

async fn run_analysis(form: AnalyzeForm, state: &AppState) -> Result<String> {
    if form.image.is_empty() {
        return Err(ProbeError::invalid_input("No image uploaded"));
    }

    let runs = match form.runs.as_deref().filter(|r| !r.is_empty()) {
        Some(raw) => {
            let runs = raw
                .parse::<u32>()
                .map_err(|_| ProbeError::invalid_input(format!("Invalid number of runs: {}", raw)))?;
            RunCount::new(runs)?
        }
        None => RunCount::new(state.config.default_runs)?,
    };

    let base_url = state.resolve_base_url(form.server_url.as_deref())?;
    let options = AnalysisOptions {
        model: state.resolve_model(form.model.as_deref()),
        runs,
        ocr: form.ocr,
        max_tokens: state.config.max_tokens,
    };

    // The temp file must outlive the analysis
    let (_staged, image) = stage_image(&form)?;

    let report = state.analyzer_for(&base_url).analyze(&image, &options).await?;
    Ok(report.render())
}

/// Image analysis tab
#[post("/api/analyze")]
pub async fn analyze(
    payload: Multipart,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let form = read_form(payload).await?;
    info!(
        "Analysis requested - Image: {:?} ({} bytes), Runs: {:?}, OCR: {}",
        form.image_name,
        form.image.len(),
        form.runs,
        form.ocr
    );

    let outcome = run_analysis(form, &state).await;

    Ok(HttpResponse::Ok().json(ResultResponse::from(outcome)))
}
