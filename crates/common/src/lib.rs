pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{detect_hostname, validate_base_url, AppConfig, MAX_RUNS, MIN_RUNS};
pub use error::{Operation, ProbeError, StreamField};
pub type Result<T> = std::result::Result<T, ProbeError>;
