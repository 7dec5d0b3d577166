//! vidgrab library

pub mod cli;
pub mod downloader;
pub mod extractor;
pub mod selector;
pub mod utils;

// Re-export main types for easier use
pub use downloader::{DownloadJob, DownloadOutcome, DownloadProgress, Downloader, FfmpegMuxer, Muxer};
pub use extractor::{fetch_media_info, MediaInfo, StreamProvider, StreamVariant, YtDlpExtractor};
pub use selector::{build_menu, ChoiceKind, SelectionChoice};
pub use utils::{AppSettings, Result, VidgrabError};
