//! Utility modules for error handling, configuration and file naming

pub mod config;
pub mod error;
pub mod filename;
pub mod platform;

// Re-export for convenience
pub use config::{AppSettings, SelectionPolicy};
pub use error::{Result, VidgrabError};
pub use filename::{output_filename, sanitize_filename, temp_file_path};
pub use platform::find_tool;
