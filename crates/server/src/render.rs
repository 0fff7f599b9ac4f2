//! UI boundary adapter
//!
//! Internally every operation returns `Result`; the UI shows whichever side
//! came back as plain text in the same result box.

use std::fmt::Display;
use visionprobe_common::Result;

use crate::types::ResultResponse;

/// Text shown for an operation outcome
pub fn display_text<T: Display>(outcome: &Result<T>) -> String {
    match outcome {
        Ok(value) => value.to_string(),
        Err(e) => e.to_string(),
    }
}

impl<T: Display> From<Result<T>> for ResultResponse {
    fn from(outcome: Result<T>) -> Self {
        Self {
            result: display_text(&outcome),
            ok: outcome.is_ok(),
        }
    }
}
