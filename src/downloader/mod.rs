//! Download orchestration module

pub mod engine;
pub mod merger;
pub mod progress;

// Re-export for convenience
pub use engine::{DownloadJob, DownloadOutcome, Downloader};
pub use merger::{FfmpegMuxer, MuxRequest, Muxer};
pub use progress::{DownloadProgress, DownloadStage, DownloadStatus, MergeProgress, ProgressEvent};
