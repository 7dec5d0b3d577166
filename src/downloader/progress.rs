//! Progress tracking for downloads and merges

use crate::extractor::models::StreamVariant;
use std::time::Duration;

/// Which part of a job a progress update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStage {
    /// Single-file download of a variant that already has what it needs
    Direct,
    /// Video half of a merge job
    Video,
    /// Audio half of a merge job
    Audio,
}

/// Byte progress of one stream
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub stage: DownloadStage,
    pub status: DownloadStatus,
    pub downloaded_bytes: u64,
    /// Unknown for some variants; progress is indeterminate then
    pub total_bytes: Option<u64>,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
}

impl DownloadProgress {
    /// Tracker for one stage, before any byte arrived
    pub fn new(stage: DownloadStage, total_bytes: Option<u64>) -> Self {
        Self {
            stage,
            status: DownloadStatus::Initializing,
            downloaded_bytes: 0,
            total_bytes,
            speed: 0.0,
            eta: None,
        }
    }

    /// Record bytes written so far and the current rate
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;
        self.status = DownloadStatus::Downloading;

        self.eta = match self.total_bytes {
            Some(total) if downloaded_bytes >= total => Some(Duration::ZERO),
            Some(total) if speed > 0.0 => Some(Duration::from_secs_f64(
                (total - downloaded_bytes) as f64 / speed,
            )),
            _ => None,
        };
    }

    /// All chunks written and flushed
    pub fn complete(&mut self) {
        self.status = DownloadStatus::Completed;
        self.eta = Some(Duration::ZERO);
    }

    pub fn failed(&mut self, error: String) {
        self.status = DownloadStatus::Failed(error);
    }

    /// Progress fraction (0.0 to 1.0), `None` when the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) | None => None,
            Some(total) => Some((self.downloaded_bytes as f64 / total as f64).min(1.0)),
        }
    }
}

/// Lifecycle of one stage
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DownloadStatus {
    #[default]
    Initializing,
    Downloading,
    Completed,
    Failed(String),
}

/// Progress of the mux step
#[derive(Debug, Clone, PartialEq)]
pub struct MergeProgress {
    /// Fraction of the media duration processed, when the duration is known
    pub fraction: Option<f64>,
    pub finished: bool,
}

/// Everything the presenter is told while a job runs
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Audio stream picked for a merge job
    AudioSelected(StreamVariant),
    Download(DownloadProgress),
    Merge(MergeProgress),
}
