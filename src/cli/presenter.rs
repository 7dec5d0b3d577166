//! Terminal rendering: panels, spinners and progress bars
//!
//! Nothing in here makes decisions; it only draws what the shell hands it.

use crate::downloader::engine::{DownloadJob, DownloadOutcome};
use crate::downloader::progress::{
    DownloadProgress, DownloadStage, DownloadStatus, MergeProgress, ProgressEvent,
};
use crate::extractor::models::{MediaInfo, StreamVariant};
use crate::selector::format_file_size;
use crate::utils::error::VidgrabError;
use console::{measure_text_width, pad_str, style, Alignment, Style};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;

const DESCRIPTION_PREVIEW_CHARS: usize = 100;
const TICK: Duration = Duration::from_millis(100);

/// Draws everything the user sees apart from prompts
#[derive(Debug, Clone, Default)]
pub struct Presenter {
    debug: bool,
}

impl Presenter {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn welcome(&self) {
        println!();
        println!("{}", style("  ▌ vidgrab").red().bold());
        println!("{}", style("  ▌ Interactive video downloader").cyan().bold());
        println!();
        if self.debug {
            println!("{}", style("Debug mode enabled").magenta());
            println!();
        }
    }

    /// Spinner shown while something without byte progress runs
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(TICK);
        spinner
    }

    pub fn media_info(&self, info: &MediaInfo) {
        println!("{}", panel("VIDEO INFO", &info_lines(info), &Style::new().cyan()));
    }

    pub fn download_panel(&self, job: &DownloadJob) {
        let (title, quality) = if job.requires_merge() {
            ("DOWNLOAD + MERGE", format!("Video: {} + best audio", job.variant.label()))
        } else {
            ("DOWNLOAD", format!("Quality: {}", job.variant.label()))
        };
        let lines = vec![
            style(format!("Folder: {}", job.destination.display())).cyan().to_string(),
            style(format!("File: {}", job.output_filename())).green().to_string(),
            style(quality).yellow().to_string(),
        ];
        println!("{}", panel(title, &lines, &Style::new().green()));
    }

    pub fn success(&self, job: &DownloadJob, outcome: &DownloadOutcome) {
        let file_name = outcome
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut lines = vec![
            style("Done!").green().bold().to_string(),
            format!("File: {}", file_name),
            style(format!("Folder: {}", job.destination.display())).cyan().to_string(),
            style(format!("Size: {}", format_file_size(Some(outcome.bytes_written))))
                .yellow()
                .to_string(),
        ];
        if let Some(audio) = &outcome.merged_audio {
            lines.push(
                style(format!(
                    "Quality: {} + {}",
                    job.variant.label(),
                    describe_audio(audio)
                ))
                .yellow()
                .to_string(),
            );
        }
        println!("{}", panel("DOWNLOAD COMPLETE", &lines, &Style::new().green()));
    }

    pub fn error(&self, err: &VidgrabError) {
        let lines = vec![style(err.to_string()).white().to_string()];
        eprintln!("{}", panel("ERROR", &lines, &Style::new().red()));
    }

    pub fn cancelled(&self) {
        println!("{}", style("Download cancelled.").dim());
    }

    pub fn goodbye(&self) {
        println!();
        println!("{}", style("Thanks for using vidgrab!").cyan().bold());
        println!();
    }
}

/// Consume progress events until the sender side is dropped
pub async fn render_progress(mut progress_rx: mpsc::Receiver<ProgressEvent>) {
    let mut renderer = ProgressRenderer::default();
    while let Some(event) = progress_rx.recv().await {
        renderer.handle(event);
    }
    renderer.abandon_current();
}

#[derive(Default)]
struct ProgressRenderer {
    bar: Option<ProgressBar>,
    stage: Option<DownloadStage>,
    merging: bool,
}

impl ProgressRenderer {
    fn handle(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::AudioSelected(audio) => {
                println!("{} {}", style("♪").magenta(), describe_audio(&audio));
            }
            ProgressEvent::Download(progress) => self.on_download(progress),
            ProgressEvent::Merge(progress) => self.on_merge(progress),
        }
    }

    fn on_download(&mut self, progress: DownloadProgress) {
        if self.stage != Some(progress.stage) || self.bar.is_none() {
            self.abandon_current();
            self.bar = Some(transfer_bar(progress.stage, progress.total_bytes));
            self.stage = Some(progress.stage);
        }

        let Some(bar) = self.bar.take() else {
            return;
        };
        bar.set_position(progress.downloaded_bytes);

        match progress.status {
            DownloadStatus::Completed => {
                bar.finish_with_message(format!(
                    "{} {} finished",
                    style("✓").green(),
                    stage_label(progress.stage)
                ));
            }
            DownloadStatus::Failed(msg) => {
                bar.abandon_with_message(format!(
                    "{} {} failed: {}",
                    style("✗").red(),
                    stage_label(progress.stage),
                    msg
                ));
            }
            DownloadStatus::Initializing | DownloadStatus::Downloading => self.bar = Some(bar),
        }
    }

    fn on_merge(&mut self, progress: MergeProgress) {
        if !self.merging {
            self.abandon_current();
            self.bar = Some(merge_bar());
            self.merging = true;
        }

        let Some(bar) = self.bar.take() else {
            return;
        };
        if let Some(fraction) = progress.fraction {
            bar.set_position((fraction * 100.0).round() as u64);
        }

        if progress.finished {
            bar.finish_with_message(format!("{} Merge complete", style("✓").green()));
        } else {
            self.bar = Some(bar);
        }
    }

    fn abandon_current(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}

fn info_lines(info: &MediaInfo) -> Vec<String> {
    let mut lines = vec![
        style(&info.title).white().bold().to_string(),
        style(format!("Channel: {}", info.author)).cyan().to_string(),
        style(format!("Duration: {}", format_duration(info.duration_secs)))
            .magenta()
            .to_string(),
        style(format!("Views: {}", format_count(info.view_count)))
            .green()
            .to_string(),
        style(format!(
            "Description: {}",
            preview_description(&info.description)
        ))
        .dim()
        .to_string(),
    ];
    if let Some(thumb) = info.best_thumbnail() {
        lines.push(style(format!("Thumbnail: {}", thumb.url)).blue().to_string());
    }
    lines
}

fn stage_label(stage: DownloadStage) -> &'static str {
    match stage {
        DownloadStage::Direct => "Download",
        DownloadStage::Video => "Video download",
        DownloadStage::Audio => "Audio download",
    }
}

fn transfer_bar(stage: DownloadStage, total_bytes: Option<u64>) -> ProgressBar {
    let bar = match total_bytes {
        Some(total) if total > 0 => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏ "),
            );
            bar
        }
        _ => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg} {bytes} ({bytes_per_sec})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    };
    bar.set_message(stage_label(stage));
    bar.enable_steady_tick(TICK);
    bar
}

fn merge_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.yellow} {msg} [{bar:30.yellow}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Merging video and audio");
    bar.enable_steady_tick(TICK);
    bar
}

fn describe_audio(audio: &StreamVariant) -> String {
    match audio.audio_bitrate {
        Some(kbps) => format!("audio {:.0} kbps ({})", kbps, audio.container),
        None => format!("best audio ({})", audio.container),
    }
}

/// Box a set of lines under a title
pub fn panel(title: &str, lines: &[String], border: &Style) -> String {
    let content_width = lines
        .iter()
        .map(|l| measure_text_width(l))
        .chain(std::iter::once(measure_text_width(title) + 2))
        .max()
        .unwrap_or(0);
    let inner = content_width + 2;

    let title_part = format!(" {} ", title);
    let fill = inner.saturating_sub(measure_text_width(&title_part) + 1);

    let mut out = String::new();
    out.push_str(&border.apply_to("╭─").to_string());
    out.push_str(&style(&title_part).bold().to_string());
    out.push_str(&border.apply_to(format!("{}╮", "─".repeat(fill))).to_string());
    out.push('\n');

    for line in lines {
        out.push_str(&border.apply_to("│ ").to_string());
        out.push_str(&pad_str(line, content_width, Alignment::Left, None));
        out.push_str(&border.apply_to(" │").to_string());
        out.push('\n');
    }

    out.push_str(&border.apply_to(format!("╰{}╯", "─".repeat(inner))).to_string());
    out
}

/// `H:MM:SS` for an hour or more, `M:SS` otherwise
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Thousands separators: 1234567 -> 1,234,567
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// First line-free 100 characters of a description
pub fn preview_description(description: &str) -> String {
    let flat = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let head: String = flat.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        flat
    }
}
