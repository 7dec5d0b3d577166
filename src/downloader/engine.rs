//! Download orchestration
//!
//! A variant that already carries audio is streamed to a temp file and renamed
//! to `<title>.<container>` once complete. A video-only variant is downloaded
//! to a temp file, paired with the best audio-only variant (also downloaded to
//! a temp file), and muxed into `<title>.mp4`. Every file a failed job created is removed
//! before the error is returned.

use crate::downloader::merger::{cleanup_files, MuxRequest, Muxer};
use crate::downloader::progress::{DownloadProgress, DownloadStage, MergeProgress, ProgressEvent};
use crate::extractor::models::{MediaInfo, StreamVariant};
use crate::extractor::traits::StreamProvider;
use crate::selector::best_audio;
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, VidgrabError};
use crate::utils::filename::{output_filename, temp_file_path};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Container the merge path always produces
pub const MERGED_CONTAINER: &str = "mp4";

/// One download request, alive for a single `Downloader::download` call
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub title: String,
    pub variant: StreamVariant,
    pub destination: PathBuf,
    pub duration_secs: Option<u64>,
}

impl DownloadJob {
    pub fn new(url: &str, info: &MediaInfo, variant: StreamVariant, destination: &Path) -> Self {
        Self {
            url: url.to_string(),
            title: info.title.clone(),
            variant,
            destination: destination.to_path_buf(),
            duration_secs: Some(info.duration_secs).filter(|d| *d > 0),
        }
    }

    /// Video without audio goes through the merge path
    pub fn requires_merge(&self) -> bool {
        self.variant.is_video_only()
    }

    /// Final file name derived from the sanitized title
    pub fn output_filename(&self) -> String {
        if self.requires_merge() {
            output_filename(&self.title, MERGED_CONTAINER)
        } else {
            output_filename(&self.title, &self.variant.container)
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.destination.join(self.output_filename())
    }
}

/// What a finished job left on disk
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// Audio variant muxed in, for merge jobs
    pub merged_audio: Option<StreamVariant>,
}

/// Runs download jobs against a provider and a muxer
pub struct Downloader {
    provider: Arc<dyn StreamProvider>,
    muxer: Arc<dyn Muxer>,
    progress_interval: Duration,
}

impl Downloader {
    pub fn new(
        provider: Arc<dyn StreamProvider>,
        muxer: Arc<dyn Muxer>,
        settings: &AppSettings,
    ) -> Self {
        Self {
            provider,
            muxer,
            progress_interval: settings.progress_interval,
        }
    }

    /// Materialize the job's variant as a single file in its destination
    pub async fn download(
        &self,
        job: &DownloadJob,
        progress_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<DownloadOutcome> {
        if job.requires_merge() {
            self.download_and_merge(job, &progress_tx).await
        } else {
            self.download_direct(job, &progress_tx).await
        }
    }

    async fn download_direct(
        &self,
        job: &DownloadJob,
        progress_tx: &mpsc::Sender<ProgressEvent>,
    ) -> Result<DownloadOutcome> {
        let output = job.output_path();
        info!(
            "Downloading {} ({}) to {}",
            job.variant.label(),
            job.variant.id,
            output.display()
        );

        // Bytes land in a temp file; an existing output is only replaced once complete
        let partial = temp_file_path(&job.destination, "direct", &job.variant.container);
        let bytes_written = self
            .stream_to_file(&job.url, &job.variant, &partial, DownloadStage::Direct, progress_tx)
            .await?;

        if let Err(e) = tokio::fs::rename(&partial, &output).await {
            error!("Failed to move {} into place: {}", partial.display(), e);
            cleanup_files(&[partial]).await;
            return Err(VidgrabError::write(&output, e));
        }

        Ok(DownloadOutcome {
            path: output,
            bytes_written,
            merged_audio: None,
        })
    }

    async fn download_and_merge(
        &self,
        job: &DownloadJob,
        progress_tx: &mpsc::Sender<ProgressEvent>,
    ) -> Result<DownloadOutcome> {
        let audio = self.find_best_audio(&job.url).await?;
        report(progress_tx, ProgressEvent::AudioSelected(audio.clone())).await;

        let output = job.output_path();
        let video_tmp = temp_file_path(&job.destination, "video", &job.variant.container);
        let audio_tmp = temp_file_path(&job.destination, "audio", &audio.container);
        info!(
            "Merging {} with audio {} into {}",
            job.variant.id,
            audio.id,
            output.display()
        );

        let mut mux_started = false;
        let result = self
            .merge_steps(job, &audio, &video_tmp, &audio_tmp, &output, &mut mux_started, progress_tx)
            .await;

        match result {
            Ok(()) => {
                cleanup_files(&[video_tmp, audio_tmp]).await;
                let bytes_written = tokio::fs::metadata(&output).await.map(|m| m.len()).unwrap_or(0);
                Ok(DownloadOutcome {
                    path: output,
                    bytes_written,
                    merged_audio: Some(audio),
                })
            }
            Err(e) => {
                error!("Merge job failed: {}", e);
                let mut leftovers = vec![video_tmp, audio_tmp];
                if mux_started {
                    leftovers.push(output);
                }
                cleanup_files(&leftovers).await;
                Err(e)
            }
        }
    }

    /// Video, then audio, then mux; strictly sequential
    #[allow(clippy::too_many_arguments)]
    async fn merge_steps(
        &self,
        job: &DownloadJob,
        audio: &StreamVariant,
        video_tmp: &Path,
        audio_tmp: &Path,
        output: &Path,
        mux_started: &mut bool,
        progress_tx: &mpsc::Sender<ProgressEvent>,
    ) -> Result<()> {
        self.stream_to_file(&job.url, &job.variant, video_tmp, DownloadStage::Video, progress_tx)
            .await?;
        self.stream_to_file(&job.url, audio, audio_tmp, DownloadStage::Audio, progress_tx)
            .await?;

        *mux_started = true;
        let request = MuxRequest {
            video: video_tmp.to_path_buf(),
            audio: audio_tmp.to_path_buf(),
            output: output.to_path_buf(),
            duration_secs: job.duration_secs,
        };

        let (merge_tx, mut merge_rx) = mpsc::channel::<MergeProgress>(32);
        let muxer = Arc::clone(&self.muxer);
        let merge_task = tokio::spawn(async move { muxer.mux(&request, Some(merge_tx)).await });

        while let Some(merge_progress) = merge_rx.recv().await {
            report(progress_tx, ProgressEvent::Merge(merge_progress)).await;
        }

        merge_task
            .await
            .map_err(|e| VidgrabError::Merge(format!("Merge task failed: {}", e)))?
    }

    /// Re-fetch the variant list and pick the highest-bitrate audio-only stream
    pub async fn find_best_audio(&self, url: &str) -> Result<StreamVariant> {
        let info = self.provider.fetch_info(url).await?;
        let audio = best_audio(&info.variants)
            .cloned()
            .ok_or(VidgrabError::NoAudioAvailable)?;
        debug!("Best audio: {} ({:?} kbps)", audio.id, audio.audio_bitrate);
        Ok(audio)
    }

    /// Pipe one variant into `path`, removing the partial file on failure
    async fn stream_to_file(
        &self,
        url: &str,
        variant: &StreamVariant,
        path: &Path,
        stage: DownloadStage,
        progress_tx: &mpsc::Sender<ProgressEvent>,
    ) -> Result<u64> {
        let media = self.provider.fetch_stream(url, &variant.id).await?;
        let total = media.total_bytes.or(variant.size);

        let mut progress = DownloadProgress::new(stage, total);
        report(progress_tx, ProgressEvent::Download(progress.clone())).await;

        let mut file = File::create(path)
            .await
            .map_err(|e| VidgrabError::write(path, e))?;

        let start_time = Instant::now();
        let mut last_update_time = start_time;
        let mut downloaded = 0u64;
        let mut chunks = media.chunks;

        let written: Result<()> = async {
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| VidgrabError::write(path, e))?;
                downloaded += chunk.len() as u64;

                let now = Instant::now();
                if now.duration_since(last_update_time) >= self.progress_interval {
                    progress.update(downloaded, bytes_per_second(downloaded, start_time));
                    report(progress_tx, ProgressEvent::Download(progress.clone())).await;
                    last_update_time = now;
                }
            }
            file.flush().await.map_err(|e| VidgrabError::write(path, e))
        }
        .await;

        drop(file);

        if let Err(e) = written {
            progress.failed(e.to_string());
            report(progress_tx, ProgressEvent::Download(progress)).await;
            cleanup_files(&[path.to_path_buf()]).await;
            return Err(e);
        }

        progress.update(downloaded, bytes_per_second(downloaded, start_time));
        progress.complete();
        report(progress_tx, ProgressEvent::Download(progress)).await;

        debug!("Wrote {} bytes to {}", downloaded, path.display());
        Ok(downloaded)
    }
}

fn bytes_per_second(bytes: u64, since: Instant) -> f64 {
    let elapsed = since.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        bytes as f64 / elapsed
    } else {
        0.0
    }
}

/// Best-effort send: a dropped receiver never aborts a download
async fn report(progress_tx: &mpsc::Sender<ProgressEvent>, event: ProgressEvent) {
    if progress_tx.send(event).await.is_err() {
        debug!("Progress receiver dropped");
    }
}
