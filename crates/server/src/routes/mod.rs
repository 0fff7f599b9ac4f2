pub mod analyze;
pub mod complete;
pub mod index;
pub mod pull;
pub mod system;
