//! vidgrab - interactive terminal video downloader
//!
//! Fetches the formats a video offers, lets the user pick one and a folder,
//! then downloads it. Video-only formats are paired with the best audio stream
//! and muxed with ffmpeg.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use vidgrab::cli::{DialoguerPrompter, Shell};
use vidgrab::extractor::{StreamProvider, YtDlpExtractor};
use vidgrab::utils::{find_tool, AppSettings, VidgrabError};
use vidgrab::FfmpegMuxer;

#[derive(Parser, Debug)]
#[command(name = "vidgrab", version, about = "Interactive video downloader")]
struct Args {
    /// Video URL; starts the interactive loop when omitted
    url: Option<String>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Path to the yt-dlp binary
    #[arg(long = "yt-dlp", value_name = "PATH")]
    ytdlp: Option<PathBuf>,

    /// Path to the ffmpeg binary
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.debug);

    let settings = AppSettings {
        debug: args.debug,
        ytdlp_path: args.ytdlp.clone(),
        ffmpeg_path: args.ffmpeg.clone(),
        ..Default::default()
    };

    let shell = match build_shell(settings, args.url.as_deref()) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.url.as_deref() {
        Some(url) => shell.run_once(url),
        None => shell.run_interactive(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting after error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_shell(settings: AppSettings, url: Option<&str>) -> Result<Shell<DialoguerPrompter>> {
    let extractor = YtDlpExtractor::new(&settings).context("Cannot start without yt-dlp")?;
    info!("Using yt-dlp at {}", extractor.ytdlp_path().display());
    check_ffmpeg_installed(&settings);

    let provider: Arc<dyn StreamProvider> = Arc::new(extractor);
    if let Some(url) = url {
        if !provider.validate_url(url) {
            return Err(VidgrabError::InvalidUrl(url.to_string()).into());
        }
    }

    let muxer = Arc::new(FfmpegMuxer::new(&settings));
    let shell = Shell::new(settings, provider, muxer, DialoguerPrompter::new())
        .context("Failed to start the async runtime")?;
    Ok(shell)
}

/// ffmpeg is only needed for video-only formats, so a missing one is a warning
fn check_ffmpeg_installed(settings: &AppSettings) {
    match find_tool("ffmpeg", settings.ffmpeg_path.as_deref()) {
        Ok(path) => info!("Using ffmpeg at {}", path.display()),
        Err(_) => {
            warn!("ffmpeg not found");
            eprintln!(
                "{} ffmpeg not found. Formats without audio cannot be merged.",
                style("!").yellow().bold()
            );
            eprintln!("  Install it with your package manager or pass --ffmpeg <PATH>");
        }
    }
}
