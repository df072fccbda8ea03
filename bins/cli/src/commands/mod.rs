//! Command handlers.

pub mod config;
pub mod detect;
pub mod document;

pub use config::run_config;
pub use detect::run_detect;
pub use document::{run_anonymize, run_normalize};
