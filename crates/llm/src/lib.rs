//! VisionProbe LLM Integration
//!
//! Streaming Ollama client for generation and model pulls

mod client;
mod llm_trait;
mod prompts;
pub mod stream;
mod types;

pub use client::OllamaClient;
pub use llm_trait::TextGenerator;
pub use prompts::VISUAL_BREAKDOWN_PROMPT;
pub use stream::{collect_lines, collect_stream, decode_line, decode_lines, FragmentJoin, LineSplitter};
pub use types::{GenerateRequest, PullRequest};
