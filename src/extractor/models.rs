//! Data structures for video information

use serde::{Deserialize, Serialize};

/// One encoded stream option offered by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamVariant {
    /// Opaque handle used to request the bytes (itag / format id)
    pub id: String,
    /// Coarse provider quality tag, e.g. `hd720`, `medium`
    pub quality: String,
    /// Resolution label such as `1080p`, only for variants with video
    pub quality_label: Option<String>,
    /// Container / file extension
    pub container: String,
    pub has_video: bool,
    pub has_audio: bool,
    /// Size in bytes, when the provider knows it
    pub size: Option<u64>,
    /// Audio bit rate in kbps
    pub audio_bitrate: Option<f32>,
}

impl StreamVariant {
    /// Resolution label when present, otherwise the coarse quality tag
    pub fn label(&self) -> &str {
        self.quality_label.as_deref().unwrap_or(&self.quality)
    }

    pub fn is_combined(&self) -> bool {
        self.has_video && self.has_audio
    }

    /// Video without audio; must go through the merge path
    pub fn is_video_only(&self) -> bool {
        self.has_video && !self.has_audio
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }
}

/// Thumbnail reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Snapshot of one video's metadata and available variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration_secs: u64,
    pub view_count: u64,
    pub description: String,
    pub thumbnails: Vec<Thumbnail>,
    pub variants: Vec<StreamVariant>,
}

impl MediaInfo {
    /// Largest thumbnail by pixel area
    pub fn best_thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnails
            .iter()
            .max_by_key(|t| u64::from(t.width.unwrap_or(0)) * u64::from(t.height.unwrap_or(0)))
    }
}
