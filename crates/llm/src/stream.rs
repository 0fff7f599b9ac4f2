//! JSON Lines decoding for Ollama streaming responses
//!
//! Every non-empty line of a streamed body is an independent JSON object.
//! One named field is pulled out of each object and the values are joined in
//! arrival order. The first line that is not valid JSON aborts the decode and
//! nothing decoded before it is returned.

use futures::{Stream, StreamExt};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use visionprobe_common::{ProbeError, Result, StreamField};

/// How decoded values are joined into the final text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentJoin {
    /// Fragments glued together with no separator (generate)
    Concatenate,

    /// Each value followed by a newline (pull status log)
    Lines,
}

impl FragmentJoin {
    fn append(&self, output: &mut String, fragment: &str) {
        output.push_str(fragment);
        if *self == FragmentJoin::Lines {
            output.push('\n');
        }
    }
}

/// Decode one raw line
///
/// Empty lines yield `None`. Anything else must parse as a JSON object;
/// whitespace-only lines and non-object values are malformed. A field that is
/// missing, null or not a string contributes an empty fragment.
pub fn decode_line(line: &[u8], field: StreamField) -> Result<Option<String>> {
    if line.is_empty() {
        return Ok(None);
    }

    let object: Map<String, Value> = serde_json::from_slice(line).map_err(|e| {
        warn!("Malformed JSON line in {} stream: {}", field, e);
        ProbeError::malformed_line(field)
    })?;

    let fragment = object
        .get(field.key())
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(Some(fragment.to_string()))
}

/// Lazily decode a sequence of lines, skipping empty ones
pub fn decode_lines<I, L>(lines: I, field: StreamField) -> impl Iterator<Item = Result<String>>
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    lines
        .into_iter()
        .filter_map(move |line| decode_line(line.as_ref(), field).transpose())
}

/// Decode and join a complete sequence of lines
pub fn collect_lines<I, L>(lines: I, field: StreamField, join: FragmentJoin) -> Result<String>
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    let mut output = String::new();
    for fragment in decode_lines(lines, field) {
        join.append(&mut output, &fragment?);
    }
    Ok(output)
}

/// Splits arbitrary body chunks into `\n`-terminated lines
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: Vec<u8>,
}

impl LineSplitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and take every line it completes
    ///
    /// Returned lines have the terminator (and a preceding `\r`) removed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// Take whatever followed the last newline
    pub fn finish(self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }
}

/// Drive a streamed HTTP body to completion
///
/// `on_fragment` sees each decoded value as it arrives. The returned text is
/// all-or-nothing: a malformed line or a transport error while reading the
/// body yields only the error.
pub async fn collect_stream<S, B, E, F>(
    stream: S,
    field: StreamField,
    join: FragmentJoin,
    mut on_fragment: F,
) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    F: FnMut(&str),
{
    futures::pin_mut!(stream);

    let mut splitter = LineSplitter::new();
    let mut output = String::new();
    let mut lines = 0usize;

    let mut absorb = |line: &[u8], output: &mut String| -> Result<()> {
        if let Some(fragment) = decode_line(line, field)? {
            on_fragment(&fragment);
            join.append(output, &fragment);
            lines += 1;
        }
        Ok(())
    };

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            ProbeError::network(format!("Failed to read response stream: {}", e))
        })?;

        for line in splitter.push(chunk.as_ref()) {
            absorb(&line, &mut output)?;
        }
    }

    if let Some(tail) = splitter.finish() {
        absorb(&tail, &mut output)?;
    }

    debug!("Decoded {} stream: {} lines, {} chars", field, lines, output.len());

    Ok(output)
}
