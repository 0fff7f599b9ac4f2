use std::fmt;

/// Streamed field pulled out of each JSON line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamField {
    /// Incremental text fragment from `/api/generate`
    Response,

    /// Progress line from `/api/pull`
    Status,
}

impl StreamField {
    /// JSON key for this field
    pub fn key(&self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for StreamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Server operation an HTTP failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    Pull,
}

/// VisionProbe error types
///
/// The `Display` output of the stream and status variants is the exact text
/// shown to users in place of a result.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// A response line was not valid JSON; the whole decode is aborted
    #[error("{}", malformed_line_message(.field))]
    MalformedStreamLine { field: StreamField },

    /// Server answered with something other than 200
    #[error("{}", status_message(.status, .body, .operation))]
    NonSuccessStatus {
        status: u16,
        body: String,
        operation: Operation,
    },

    /// OCR engine failure
    #[error("OCR Error: {0}")]
    Ocr(String),

    /// Network/HTTP error
    #[error("Error: Network error: {0}")]
    Network(String),

    /// Configuration error
    #[error("Error: Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Error: Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("Error: IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Error: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn malformed_line_message(field: &StreamField) -> &'static str {
    match field {
        StreamField::Response => "Error: Received a malformed JSON line from the server.",
        StreamField::Status => {
            "Error: Received a malformed JSON line from the server during model pull."
        }
    }
}

fn status_message(status: &u16, body: &str, operation: &Operation) -> String {
    match operation {
        Operation::Generate => format!(
            "Error: Server returned status code {}. Response content: {}",
            status, body
        ),
        Operation::Pull => format!(
            "Error: Server returned status code {} while pulling model. Response content: {}",
            status, body
        ),
    }
}

impl ProbeError {
    /// Create OCR error
    pub fn ocr<S: Into<String>>(msg: S) -> Self {
        Self::Ocr(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create malformed stream line error
    pub fn malformed_line(field: StreamField) -> Self {
        Self::MalformedStreamLine { field }
    }

    /// Create non-200 status error
    pub fn status(status: u16, body: impl Into<String>, operation: Operation) -> Self {
        Self::NonSuccessStatus {
            status,
            body: body.into(),
            operation,
        }
    }
}
