//! In-memory provider and muxer shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use vidgrab::downloader::{MergeProgress, MuxRequest, Muxer};
use vidgrab::extractor::{MediaInfo, MediaStream, StreamProvider, StreamVariant};
use vidgrab::utils::{Result, VidgrabError};

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub fn variant(
    id: &str,
    label: Option<&str>,
    container: &str,
    has_video: bool,
    has_audio: bool,
) -> StreamVariant {
    StreamVariant {
        id: id.to_string(),
        quality: label.unwrap_or("tiny").to_string(),
        quality_label: label.map(str::to_string),
        container: container.to_string(),
        has_video,
        has_audio,
        size: None,
        audio_bitrate: None,
    }
}

pub fn audio(id: &str, container: &str, kbps: f32) -> StreamVariant {
    StreamVariant {
        audio_bitrate: Some(kbps),
        ..variant(id, None, container, false, true)
    }
}

pub fn media_info(title: &str, variants: Vec<StreamVariant>) -> MediaInfo {
    MediaInfo {
        id: "dQw4w9WgXcQ".to_string(),
        title: title.to_string(),
        author: "Test Channel".to_string(),
        duration_secs: 212,
        view_count: 1_234_567,
        description: "A test video".to_string(),
        thumbnails: Vec::new(),
        variants,
    }
}

/// Provider serving fixed bodies from memory
pub struct FakeProvider {
    info: MediaInfo,
    bodies: HashMap<String, Vec<u8>>,
    /// Variant id -> bytes delivered before the stream breaks
    broken: HashMap<String, Vec<u8>>,
    /// URLs whose metadata fetch fails
    unavailable: Vec<String>,
    pub info_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(info: MediaInfo) -> Self {
        Self {
            info,
            bodies: HashMap::new(),
            broken: HashMap::new(),
            unavailable: Vec::new(),
            info_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_body(mut self, variant_id: &str, body: &[u8]) -> Self {
        self.bodies.insert(variant_id.to_string(), body.to_vec());
        self
    }

    pub fn with_broken_stream(mut self, variant_id: &str, partial: &[u8]) -> Self {
        self.broken.insert(variant_id.to_string(), partial.to_vec());
        self
    }

    pub fn with_unavailable(mut self, url: &str) -> Self {
        self.unavailable.push(url.to_string());
        self
    }
}

#[async_trait]
impl StreamProvider for FakeProvider {
    fn id(&self) -> &'static str {
        "fake"
    }

    fn validate_url(&self, url: &str) -> bool {
        url.starts_with("https://")
    }

    async fn fetch_info(&self, url: &str) -> Result<MediaInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.iter().any(|u| u == url) {
            return Err(VidgrabError::InfoFetch("Video unavailable".to_string()));
        }
        Ok(self.info.clone())
    }

    async fn fetch_stream(&self, _url: &str, variant_id: &str) -> Result<MediaStream> {
        if let Some(partial) = self.broken.get(variant_id) {
            let items: Vec<Result<Bytes>> = vec![
                Ok(Bytes::from(partial.clone())),
                Err(VidgrabError::Stream("connection reset".to_string())),
            ];
            return Ok(MediaStream {
                total_bytes: None,
                chunks: stream::iter(items).boxed(),
            });
        }

        let body = self
            .bodies
            .get(variant_id)
            .cloned()
            .ok_or_else(|| VidgrabError::Stream(format!("unknown variant {}", variant_id)))?;
        let total = body.len() as u64;
        let chunks: Vec<Result<Bytes>> = body
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        Ok(MediaStream {
            total_bytes: Some(total),
            chunks: stream::iter(chunks).boxed(),
        })
    }
}

/// Muxer that concatenates its inputs, or fails after writing a partial output
#[derive(Default)]
pub struct FakeMuxer {
    fail: bool,
    pub requests: Mutex<Vec<MuxRequest>>,
}

impl FakeMuxer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Muxer for FakeMuxer {
    async fn mux(
        &self,
        request: &MuxRequest,
        progress_tx: Option<mpsc::Sender<MergeProgress>>,
    ) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());

        if self.fail {
            tokio::fs::write(&request.output, b"partial")
                .await
                .map_err(|e| VidgrabError::Merge(e.to_string()))?;
            return Err(VidgrabError::Merge("boom".to_string()));
        }

        let mut merged = tokio::fs::read(&request.video)
            .await
            .map_err(|e| VidgrabError::Merge(e.to_string()))?;
        let audio = tokio::fs::read(&request.audio)
            .await
            .map_err(|e| VidgrabError::Merge(e.to_string()))?;
        merged.extend_from_slice(&audio);
        tokio::fs::write(&request.output, merged)
            .await
            .map_err(|e| VidgrabError::Merge(e.to_string()))?;

        if let Some(tx) = progress_tx {
            let _ = tx
                .send(MergeProgress {
                    fraction: Some(1.0),
                    finished: true,
                })
                .await;
        }
        Ok(())
    }
}

/// Names of every entry in `dir`, sorted
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
