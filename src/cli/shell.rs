//! Interactive shell
//!
//! Drives one URL at a time through fetch, format choice, destination choice
//! and download. All async work runs on a current-thread runtime owned by the
//! shell, so the prompts themselves stay synchronous.

use crate::cli::presenter::{render_progress, Presenter};
use crate::cli::prompt::Prompter;
use crate::downloader::engine::{DownloadJob, DownloadOutcome, Downloader};
use crate::downloader::merger::Muxer;
use crate::extractor::fetcher::fetch_media_info;
use crate::extractor::models::{MediaInfo, StreamVariant};
use crate::extractor::traits::StreamProvider;
use crate::selector::build_menu;
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, VidgrabError};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tracing::{debug, info};

const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// How a single URL run ended when nothing went wrong
#[derive(Debug)]
pub enum Outcome {
    Downloaded(Box<(DownloadJob, DownloadOutcome)>),
    /// User said no at the final confirmation
    Declined,
}

pub struct Shell<P: Prompter> {
    settings: AppSettings,
    provider: Arc<dyn StreamProvider>,
    downloader: Downloader,
    presenter: Presenter,
    prompter: P,
    runtime: Runtime,
}

impl<P: Prompter> Shell<P> {
    pub fn new(
        settings: AppSettings,
        provider: Arc<dyn StreamProvider>,
        muxer: Arc<dyn Muxer>,
        prompter: P,
    ) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let downloader = Downloader::new(Arc::clone(&provider), muxer, &settings);
        let presenter = Presenter::new(settings.debug);

        Ok(Self {
            settings,
            provider,
            downloader,
            presenter,
            prompter,
            runtime,
        })
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Prompt for URLs until the user is done; only fatal errors escape
    pub fn run_interactive(&self) -> Result<()> {
        self.presenter.welcome();

        loop {
            let result = self.prompt_url().and_then(|url| self.process_url(&url));
            self.report(result)?;

            if !self.prompter.confirm("Download another video?", false)? {
                break;
            }
            println!();
        }

        self.presenter.goodbye();
        Ok(())
    }

    /// Run the flow once for `url`; every error is rendered and returned
    pub fn run_once(&self, url: &str) -> Result<()> {
        self.presenter.welcome();

        match self.process_url(url) {
            Ok(outcome) => self.report(Ok(outcome))?,
            Err(e) => {
                self.presenter.error(&e);
                return Err(e);
            }
        }

        self.presenter.goodbye();
        Ok(())
    }

    /// Render a per-URL result; fatal errors are passed back up
    fn report(&self, result: Result<Outcome>) -> Result<()> {
        match result {
            Ok(Outcome::Downloaded(done)) => {
                let (job, outcome) = *done;
                self.presenter.success(&job, &outcome);
                Ok(())
            }
            Ok(Outcome::Declined) => {
                self.presenter.cancelled();
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                self.presenter.error(&e);
                Err(e)
            }
            Err(e) => {
                debug!("Recoverable error: {:?}", e);
                self.presenter.error(&e);
                Ok(())
            }
        }
    }

    pub fn process_url(&self, url: &str) -> Result<Outcome> {
        let info = self.fetch_info(url)?;
        self.presenter.media_info(&info);

        let variant = self.choose_format(&info)?;
        let destination = self.choose_destination()?;

        if !self.prompter.confirm("Start download?", true)? {
            info!("Download declined for {}", url);
            return Ok(Outcome::Declined);
        }

        let job = DownloadJob::new(url.trim(), &info, variant, &destination);
        self.presenter.download_panel(&job);

        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let renderer = self.runtime.spawn(render_progress(progress_rx));
        let result = self
            .runtime
            .block_on(self.downloader.download(&job, progress_tx));
        // Sender is gone once download returns; wait for the bars to settle
        let _ = self.runtime.block_on(renderer);

        let outcome = result?;
        Ok(Outcome::Downloaded(Box::new((job, outcome))))
    }

    fn fetch_info(&self, url: &str) -> Result<MediaInfo> {
        let spinner = self.presenter.spinner("Fetching video info...");
        let result = self
            .runtime
            .block_on(fetch_media_info(self.provider.as_ref(), url));

        match &result {
            Ok(_) => spinner.finish_with_message("Video info fetched"),
            Err(_) => spinner.finish_and_clear(),
        }
        result
    }

    fn prompt_url(&self) -> Result<String> {
        let provider = Arc::clone(&self.provider);
        let check = move |text: &str| -> std::result::Result<(), String> {
            if text.is_empty() {
                Err("Please enter a URL.".to_string())
            } else if !provider.validate_url(text) {
                Err("Invalid URL. Please enter a valid video URL.".to_string())
            } else {
                Ok(())
            }
        };
        self.prompter.input("Video URL", None, &check)
    }

    fn choose_format(&self, info: &MediaInfo) -> Result<StreamVariant> {
        let menu = build_menu(&info.variants, &self.settings.selection)?;
        let labels: Vec<String> = menu.iter().map(|choice| choice.label.clone()).collect();

        let index = self.prompter.select("Choose the quality", &labels, 0)?;
        let choice = menu
            .into_iter()
            .nth(index)
            .ok_or(VidgrabError::EmptySelection)?;

        debug!("Selected {} ({:?})", choice.variant.id, choice.kind);
        Ok(choice.variant)
    }

    fn choose_destination(&self) -> Result<PathBuf> {
        let current = &self.settings.download_dir;
        let prompt = format!("Download to {}?", current.display());
        if self.prompter.confirm(&prompt, true)? {
            return absolutize(current);
        }

        let check = |text: &str| -> std::result::Result<(), String> {
            if expand_home(text).is_dir() {
                Ok(())
            } else {
                Err("Folder does not exist. Please enter a valid path.".to_string())
            }
        };
        let default = current.display().to_string();
        let input = self
            .prompter
            .input("Download folder", Some(&default), &check)?;

        absolutize(&expand_home(&input))
    }
}

/// `~` and `~/...` resolve against the home directory
fn expand_home(input: &str) -> PathBuf {
    let input = input.trim();
    match (input.strip_prefix('~'), dirs::home_dir()) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') || rest.starts_with('\\') => {
            home.join(&rest[1..])
        }
        _ => PathBuf::from(input),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    Ok(path.absolutize()?.to_path_buf())
}
