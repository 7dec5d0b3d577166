//! Muxing separate video and audio files into one container

use crate::downloader::progress::MergeProgress;
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, VidgrabError};
use crate::utils::platform::find_tool;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Inputs and output of one mux operation
#[derive(Debug, Clone)]
pub struct MuxRequest {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub output: PathBuf,
    /// Media duration, used to turn ffmpeg timestamps into a fraction
    pub duration_secs: Option<u64>,
}

/// Combines a video-only file and an audio-only file
#[async_trait]
pub trait Muxer: Send + Sync {
    /// Copy the video stream, transcode audio to AAC, write `request.output`.
    /// Fails with `Merge`.
    async fn mux(
        &self,
        request: &MuxRequest,
        progress_tx: Option<mpsc::Sender<MergeProgress>>,
    ) -> Result<()>;
}

/// Muxer driving the ffmpeg binary
pub struct FfmpegMuxer {
    configured_path: Option<PathBuf>,
}

impl FfmpegMuxer {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            configured_path: settings.ffmpeg_path.clone(),
        }
    }

    fn args(request: &MuxRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-nostats", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(request.video.clone().into_os_string());
        args.push("-i".into());
        args.push(request.audio.clone().into_os_string());
        args.extend(
            [
                "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-progress",
                "pipe:1",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(request.output.clone().into_os_string());
        args
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    async fn mux(
        &self,
        request: &MuxRequest,
        progress_tx: Option<mpsc::Sender<MergeProgress>>,
    ) -> Result<()> {
        let ffmpeg = find_tool("ffmpeg", self.configured_path.as_deref())
            .map_err(|e| VidgrabError::Merge(e.to_string()))?;

        debug!(
            "Muxing {} + {} into {}",
            request.video.display(),
            request.audio.display(),
            request.output.display()
        );

        let mut child = AsyncCommand::new(&ffmpeg)
            .args(Self::args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VidgrabError::Merge(format!("Failed to start ffmpeg: {}", e)))?;

        // Keep the last diagnostic line for the error message
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                let mut last = String::new();
                while let Ok(Some(line)) = lines.next_line().await {
                    if !line.trim().is_empty() {
                        debug!("ffmpeg: {}", line);
                        last = line;
                    }
                }
                last
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(update) = parse_ffmpeg_progress(&line, request.duration_secs) {
                    if let Some(ref tx) = progress_tx {
                        let _ = tx.send(update).await;
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| VidgrabError::Merge(format!("Failed to wait for ffmpeg: {}", e)))?;

        let last_line = match stderr_task {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(VidgrabError::Merge(format!(
                "ffmpeg exited with {}: {}",
                status, last_line
            )));
        }

        info!("Merged into {}", request.output.display());
        Ok(())
    }
}

/// Parse one line of `ffmpeg -progress` output
///
/// `out_time_us` / `out_time_ms` both carry microseconds.
pub fn parse_ffmpeg_progress(line: &str, duration_secs: Option<u64>) -> Option<MergeProgress> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "progress" if value == "end" => Some(MergeProgress {
            fraction: Some(1.0),
            finished: true,
        }),
        "out_time_us" | "out_time_ms" => {
            let micros: u64 = value.trim().parse().ok()?;
            let fraction = duration_secs
                .filter(|d| *d > 0)
                .map(|d| (micros as f64 / (d as f64 * 1_000_000.0)).min(1.0));
            Some(MergeProgress {
                fraction,
                finished: false,
            })
        }
        _ => None,
    }
}

/// Remove files a job created; missing files are ignored
pub async fn cleanup_files(paths: &[PathBuf]) {
    for path in paths {
        if path.exists() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("Failed to remove temporary file {}: {}", path.display(), e);
            } else {
                debug!("Removed temporary file: {}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ============================================================
    // PROGRESS PARSING
    // ============================================================

    #[test]
    fn test_parse_out_time_with_duration() {
        let update = parse_ffmpeg_progress("out_time_us=5000000", Some(10)).unwrap();
        assert_eq!(update.fraction, Some(0.5));
        assert!(!update.finished);

        let update = parse_ffmpeg_progress("out_time_ms=20000000", Some(10)).unwrap();
        assert_eq!(update.fraction, Some(1.0), "fraction is clamped");
    }

    #[test]
    fn test_parse_out_time_without_duration() {
        let update = parse_ffmpeg_progress("out_time_us=5000000", None).unwrap();
        assert_eq!(update.fraction, None);
        let update = parse_ffmpeg_progress("out_time_us=5000000", Some(0)).unwrap();
        assert_eq!(update.fraction, None);
    }

    #[test]
    fn test_parse_progress_end_and_noise() {
        let end = parse_ffmpeg_progress("progress=end", Some(10)).unwrap();
        assert!(end.finished);
        assert_eq!(end.fraction, Some(1.0));

        assert!(parse_ffmpeg_progress("progress=continue", Some(10)).is_none());
        assert!(parse_ffmpeg_progress("out_time_us=N/A", Some(10)).is_none());
        assert!(parse_ffmpeg_progress("bitrate=128.0kbits/s", Some(10)).is_none());
        assert!(parse_ffmpeg_progress("garbage", Some(10)).is_none());
    }

    #[test]
    fn test_args_copy_video_and_encode_aac() {
        let request = MuxRequest {
            video: PathBuf::from("v.mp4"),
            audio: PathBuf::from("a.webm"),
            output: PathBuf::from("out.mp4"),
            duration_secs: None,
        };
        let args: Vec<String> = FfmpegMuxer::args(&request)
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-i v.mp4 -i a.webm"));
        assert!(joined.contains("-c:v copy"));
        assert!(joined.contains("-c:a aac"));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    // ============================================================
    // CLEANUP
    // ============================================================

    #[tokio::test]
    async fn test_cleanup_removes_files() {
        let temp_dir = TempDir::new().unwrap();
        let paths: Vec<_> = (0..3)
            .map(|i| temp_dir.path().join(format!("temp_{}.tmp", i)))
            .collect();
        for path in &paths {
            std::fs::write(path, b"temporary data").unwrap();
        }

        cleanup_files(&paths).await;

        for path in &paths {
            assert!(!path.exists(), "{} should be removed", path.display());
        }
    }

    #[tokio::test]
    async fn test_cleanup_mixed_existing_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("existing.tmp");
        let missing = temp_dir.path().join("missing.tmp");
        std::fs::write(&existing, b"data").unwrap();

        cleanup_files(&[existing.clone(), missing]).await;
        assert!(!existing.exists());
    }

    // ============================================================
    // FFMPEG PROCESS HANDLING (fake binary)
    // ============================================================

    #[cfg(unix)]
    fn fake_ffmpeg(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ffmpeg_failure_reports_last_stderr_line() {
        let temp_dir = TempDir::new().unwrap();
        let script = fake_ffmpeg(
            temp_dir.path(),
            "echo 'out_time_us=1000000'\necho 'Conversion failed!' >&2\nexit 1",
        );
        let settings = AppSettings {
            ffmpeg_path: Some(script),
            ..Default::default()
        };
        let request = MuxRequest {
            video: temp_dir.path().join("v.mp4"),
            audio: temp_dir.path().join("a.m4a"),
            output: temp_dir.path().join("out.mp4"),
            duration_secs: Some(2),
        };

        let err = FfmpegMuxer::new(&settings).mux(&request, None).await.unwrap_err();
        match err {
            VidgrabError::Merge(msg) => assert!(msg.contains("Conversion failed!"), "{}", msg),
            other => panic!("expected merge error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ffmpeg_success_forwards_progress() {
        let temp_dir = TempDir::new().unwrap();
        let script = fake_ffmpeg(
            temp_dir.path(),
            "echo 'out_time_us=1000000'\necho 'progress=end'\nexit 0",
        );
        let settings = AppSettings {
            ffmpeg_path: Some(script),
            ..Default::default()
        };
        let request = MuxRequest {
            video: temp_dir.path().join("v.mp4"),
            audio: temp_dir.path().join("a.m4a"),
            output: temp_dir.path().join("out.mp4"),
            duration_secs: Some(2),
        };

        let (tx, mut rx) = mpsc::channel(16);
        FfmpegMuxer::new(&settings)
            .mux(&request, Some(tx))
            .await
            .unwrap();

        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].fraction, Some(0.5));
        assert!(updates[1].finished);
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_merge_error() {
        let settings = AppSettings {
            ffmpeg_path: Some(PathBuf::from("/definitely/not/here/ffmpeg")),
            ..Default::default()
        };
        let request = MuxRequest {
            video: PathBuf::from("v.mp4"),
            audio: PathBuf::from("a.m4a"),
            output: PathBuf::from("out.mp4"),
            duration_secs: None,
        };
        let err = FfmpegMuxer::new(&settings).mux(&request, None).await.unwrap_err();
        assert!(matches!(err, VidgrabError::Merge(_)));
    }
}
