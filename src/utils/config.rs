//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application settings, built once at start-up and handed to each component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Verbose tracing to the terminal
    pub debug: bool,

    /// Folder proposed when the user picks a destination
    pub download_dir: PathBuf,

    /// Explicit yt-dlp binary, otherwise discovered on the system
    pub ytdlp_path: Option<PathBuf>,

    /// Explicit ffmpeg binary, otherwise discovered on the system
    pub ffmpeg_path: Option<PathBuf>,

    /// Menu caps for the format selector
    pub selection: SelectionPolicy,

    /// Minimum time between two byte-progress updates
    pub progress_interval: Duration,

    /// Timeout for establishing the media HTTP connection
    pub connect_timeout: Duration,

    /// User agent sent when streaming media
    pub user_agent: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug: false,
            download_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            ytdlp_path: None,
            ffmpeg_path: None,
            selection: SelectionPolicy::default(),
            progress_interval: Duration::from_millis(200),
            connect_timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// How many entries of each bucket the format menu keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    pub video_only_limit: usize,
    pub audio_only_limit: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            video_only_limit: 4,
            audio_only_limit: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppSettings::default();
        assert!(!config.debug);
        assert!(config.ytdlp_path.is_none());
        assert!(config.ffmpeg_path.is_none());
        assert!(config.progress_interval > Duration::ZERO);
        assert_eq!(config.selection, SelectionPolicy::default());
    }

    #[test]
    fn test_default_selection_caps() {
        let policy = SelectionPolicy::default();
        assert_eq!(policy.video_only_limit, 4);
        assert_eq!(policy.audio_only_limit, 2);
    }

    #[test]
    fn test_settings_serde_roundtrip_keeps_debug_flag() {
        let settings = AppSettings {
            debug: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert!(back.debug);
        assert_eq!(back.selection, settings.selection);
    }
}
