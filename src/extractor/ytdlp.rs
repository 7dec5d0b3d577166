//! yt-dlp wrapper for video extraction
//!
//! Metadata comes from `yt-dlp --dump-json`; media bytes are fetched by
//! resolving the direct URL of a format with `yt-dlp -g` and streaming it
//! over HTTP.

use crate::extractor::models::{MediaInfo, StreamVariant, Thumbnail};
use crate::extractor::traits::{MediaStream, StreamProvider};
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, VidgrabError};
use crate::utils::platform::find_tool;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, info};
use url::Url;

const YOUTUBE_HOSTS: [&str; 6] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Stream provider backed by the yt-dlp binary
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
    client: Client,
}

impl YtDlpExtractor {
    /// Locate yt-dlp and build the HTTP client used for media streams
    pub fn new(settings: &AppSettings) -> Result<Self> {
        let ytdlp_path = find_tool("yt-dlp", settings.ytdlp_path.as_deref())?;
        info!("Found yt-dlp at: {}", ytdlp_path.display());

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| VidgrabError::Stream(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { ytdlp_path, client })
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// Resolve the direct media URL of one format
    /// Uses: yt-dlp -f <id> -g
    async fn get_direct_url(&self, url: &str, format_id: &str) -> Result<String> {
        debug!("Getting direct URL for format {} from {}", format_id, url);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .arg("-f")
            .arg(format_id)
            .arg("-g")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg(url)
            .output()
            .await
            .map_err(|e| VidgrabError::Stream(format!("Failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            error!("Failed to get direct URL: {}", error_msg);
            return Err(VidgrabError::Stream(error_msg.trim().to_string()));
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| VidgrabError::Stream(format!("yt-dlp returned no URL for format {}", format_id)))
    }
}

#[async_trait]
impl StreamProvider for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    fn validate_url(&self, url: &str) -> bool {
        extract_video_id(url).is_some()
    }

    /// Extract video information without downloading
    /// Uses: yt-dlp --dump-json --no-download
    async fn fetch_info(&self, url: &str) -> Result<MediaInfo> {
        debug!("Extracting video info for URL: {}", url);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg(url)
            .output()
            .await
            .map_err(|e| VidgrabError::InfoFetch(format!("Failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            error!("yt-dlp extraction failed: {}", error_msg);
            return Err(VidgrabError::InfoFetch(error_msg.trim().to_string()));
        }

        let info = parse_info_json(&output.stdout)?;
        debug!("yt-dlp reported {} formats for {}", info.variants.len(), info.id);
        Ok(info)
    }

    async fn fetch_stream(&self, url: &str, variant_id: &str) -> Result<MediaStream> {
        let direct_url = self.get_direct_url(url, variant_id).await?;

        let response = self
            .client
            .get(&direct_url)
            .send()
            .await
            .map_err(|e| VidgrabError::Stream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VidgrabError::Stream(format!("HTTP error: {}", response.status())));
        }

        let total_bytes = response.content_length();
        debug!("Streaming format {} ({:?} bytes)", variant_id, total_bytes);

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| VidgrabError::Stream(e.to_string())))
            .boxed();

        Ok(MediaStream { total_bytes, chunks })
    }
}

// ============================================================
// yt-dlp JSON
// ============================================================

#[derive(Debug, Deserialize)]
struct RawVideo {
    id: String,
    title: String,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    view_count: Option<u64>,
    description: Option<String>,
    #[serde(default)]
    thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    format_note: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    abr: Option<f32>,
}

/// `"none"` means the stream is absent; a missing field means unknown
fn codec_present(codec: Option<&str>) -> Option<bool> {
    codec.map(|c| !c.is_empty() && c != "none")
}

impl From<RawFormat> for StreamVariant {
    fn from(raw: RawFormat) -> Self {
        let (has_video, has_audio) = match (
            codec_present(raw.vcodec.as_deref()),
            codec_present(raw.acodec.as_deref()),
        ) {
            (Some(v), Some(a)) => (v, a),
            (Some(v), None) => (v, raw.abr.is_some()),
            (None, Some(a)) => (raw.height.is_some(), a),
            (None, None) => (raw.height.is_some(), raw.abr.is_some()),
        };

        let quality_label = if has_video {
            raw.height.map(|h| format!("{}p", h))
        } else {
            None
        };

        StreamVariant {
            id: raw.format_id,
            quality: raw.format_note.unwrap_or_else(|| "unknown".to_string()),
            quality_label,
            container: raw.ext.unwrap_or_else(|| "unknown".to_string()),
            has_video,
            has_audio,
            size: raw
                .filesize
                .or(raw.filesize_approx)
                .filter(|s| *s > 0.0)
                .map(|s| s as u64),
            audio_bitrate: raw.abr,
        }
    }
}

/// Convert one `--dump-json` document into a [`MediaInfo`]
pub fn parse_info_json(json: &[u8]) -> Result<MediaInfo> {
    let raw: RawVideo = serde_json::from_slice(json)
        .map_err(|e| VidgrabError::InfoFetch(format!("Unexpected yt-dlp output: {}", e)))?;

    Ok(MediaInfo {
        id: raw.id,
        title: raw.title,
        author: raw
            .channel
            .or(raw.uploader)
            .unwrap_or_else(|| "Unknown".to_string()),
        duration_secs: raw.duration.map(|d| d.round() as u64).unwrap_or(0),
        view_count: raw.view_count.unwrap_or(0),
        description: raw.description.unwrap_or_default(),
        thumbnails: raw
            .thumbnails
            .into_iter()
            .map(|t| Thumbnail {
                url: t.url,
                width: t.width,
                height: t.height,
            })
            .collect(),
        variants: raw.formats.into_iter().map(StreamVariant::from).collect(),
    })
}

// ============================================================
// URL validation
// ============================================================

/// Extract the 11-character video id from a YouTube URL
pub fn extract_video_id(input: &str) -> Option<String> {
    let parsed = Url::parse(input.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    let candidate = if host == "youtu.be" {
        parsed.path_segments()?.next().map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        let mut segments = parsed.path_segments()?;
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("shorts") | Some("embed") | Some("live") | Some("v") => {
                segments.next().map(str::to_string)
            }
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| is_valid_video_id(id))
}

fn is_valid_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ============================================================
// Tests
// ============================================================
