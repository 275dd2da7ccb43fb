// Session loop - prompt, fetch, show the menu, download, repeat
//
// The loop is an explicit state machine. Every failure lands back at the
// URL prompt; only quitting, end of input or a double Ctrl+C leave it.

mod console;

#[cfg(test)]
pub use console::ScriptedConsole;
pub use console::{Console, Input, StdConsole};

use std::io::Write;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::downloader::catalog::build_catalog;
use crate::downloader::errors::DownloadError;
use crate::downloader::extractors::{describe_failure, InfoExtractor};
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::{DownloadRequest, MediaInfo, QualityOption};
use crate::downloader::progress::ProgressEvent;
use crate::downloader::tools::ffmpeg_location;
use crate::downloader::url::{is_playlist_url, normalize_url};

pub const AUDIO_MENU_LABEL: &str = "Audio only (MP3)";

/// Proxy state shared by every iteration of the loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub proxy: Option<String>,
}

impl SessionContext {
    pub fn new(proxy: Option<String>) -> Self {
        Self { proxy }
    }

    /// Stop using the proxy for the rest of the session
    pub fn downgrade_to_direct(&mut self) {
        if let Some(proxy) = self.proxy.take() {
            tracing::warn!(proxy = %proxy, "proxy disabled for this session");
        }
    }
}

/// Everything one download needs
#[derive(Debug, Clone)]
pub struct Selection {
    pub option: QualityOption,
    pub info: MediaInfo,
    /// Normalized URL the user entered
    pub url: String,
    pub proxy: Option<String>,
    pub output_dir: String,
}

impl Selection {
    fn output_template(&self) -> String {
        if self.info.is_playlist() {
            format!("{}/%(playlist_title)s/%(title)s.%(ext)s", self.output_dir)
        } else {
            format!("{}/%(title)s.%(ext)s", self.output_dir)
        }
    }

    pub fn to_request(&self, merge_output_format: &str, ffmpeg: Option<&PathBuf>) -> DownloadRequest {
        let chosen = if self.option.is_audio_only() {
            None
        } else {
            self.option.variant.as_ref()
        };
        let selection = FormatSelector::build(chosen, &self.info.formats);

        DownloadRequest {
            url: self.info.download_url(&self.url).to_string(),
            format: selection.format_spec,
            output_template: self.output_template(),
            proxy: self.proxy.clone(),
            ffmpeg_location: ffmpeg.map(|p| ffmpeg_location(p)),
            merge_output_format: Some(merge_output_format.to_string()),
            subtitles: !selection.audio_only && self.info.has_subtitles(),
            audio_multistreams: selection.audio_multistreams,
            extract_audio: selection.audio_only,
            playlist: self.info.is_playlist(),
        }
    }
}

#[derive(Debug)]
pub enum SessionState {
    AwaitingUrl,
    Extracting { url: String },
    AwaitingSelection { url: String, info: MediaInfo },
    Downloading(Box<Selection>),
    AwaitingContinue,
    Exit(i32),
}

fn is_quit(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "q" | "quit")
}

/// Menu rows: the catalog plus an MP3 row when the source has video
pub fn menu_options(info: &MediaInfo) -> Vec<QualityOption> {
    let mut options = build_catalog(&info.formats);
    if options.iter().any(|o| !o.is_audio_only()) {
        options.push(QualityOption {
            label: AUDIO_MENU_LABEL.to_string(),
            variant: None,
        });
    }
    options
}

fn size_label(bytes: Option<u64>) -> String {
    match bytes {
        Some(b) => format!("~{:.1} MiB", b as f64 / (1024.0 * 1024.0)),
        None => String::new(),
    }
}

fn report_progress(event: ProgressEvent) {
    match event {
        ProgressEvent::Destination(file) => println!("\n  -> {}", file),
        ProgressEvent::Progress { status, .. } => {
            print!("\r  {}", status);
            let _ = std::io::stdout().flush();
        }
        ProgressEvent::Merging => println!("\n  [*] Merging streams ..."),
        ProgressEvent::ExtractingAudio => println!("\n  [*] Converting to MP3 ..."),
        ProgressEvent::EmbeddingSubtitles => println!("\n  [*] Embedding subtitles ..."),
        ProgressEvent::AlreadyDownloaded => println!("\n  [=] Already downloaded."),
    }
}

pub struct Session<'a, C: Console> {
    console: C,
    backend: &'a dyn InfoExtractor,
    config: AppConfig,
    context: SessionContext,
    ffmpeg: Option<PathBuf>,
}

impl<'a, C: Console> Session<'a, C> {
    pub fn new(console: C, backend: &'a dyn InfoExtractor, config: AppConfig, context: SessionContext) -> Self {
        Self {
            console,
            backend,
            config,
            context,
            ffmpeg: None,
        }
    }

    pub fn with_ffmpeg(mut self, ffmpeg: Option<PathBuf>) -> Self {
        self.ffmpeg = ffmpeg;
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Drive the loop until the user leaves; returns the exit code
    pub async fn run(&mut self) -> i32 {
        let mut state = SessionState::AwaitingUrl;
        loop {
            state = match state {
                SessionState::AwaitingUrl => self.await_url().await,
                SessionState::Extracting { url } => self.extract(url).await,
                SessionState::AwaitingSelection { url, info } => self.select(url, info).await,
                SessionState::Downloading(selection) => self.download(*selection).await,
                SessionState::AwaitingContinue => self.await_continue().await,
                SessionState::Exit(code) => {
                    tracing::info!(code, "session finished");
                    return code;
                }
            };
        }
    }

    /// Read one trimmed answer. `None` means leave: end of input, or an
    /// interrupt followed by another interrupt or a quit at the retry prompt.
    async fn ask(&mut self, prompt: &str) -> Option<String> {
        loop {
            match self.console.read_line(prompt).await {
                Input::Line(line) => return Some(line.trim().to_string()),
                Input::Eof => return None,
                Input::Interrupted => {
                    tracing::debug!("interrupted at prompt");
                    let retry = self
                        .console
                        .read_line("[!] Interrupted. Press Enter to retry, 'q' to exit: ")
                        .await;
                    match retry {
                        Input::Line(answer) if !is_quit(&answer) => continue,
                        _ => return None,
                    }
                }
            }
        }
    }

    async fn await_url(&mut self) -> SessionState {
        let raw = match self.ask("\nEnter URL: ").await {
            Some(raw) => raw,
            None => return SessionState::Exit(0),
        };

        if raw.is_empty() {
            return SessionState::AwaitingUrl;
        }
        if is_quit(&raw) {
            return SessionState::Exit(0);
        }

        let url = normalize_url(&raw, self.config.url_policy);
        tracing::debug!(raw = %raw, url = %url, "url normalized");
        SessionState::Extracting { url }
    }

    async fn fetch(&self, url: &str) -> Result<MediaInfo, DownloadError> {
        let config = self
            .config
            .extractor
            .clone()
            .with_proxy(self.context.proxy.clone())
            .with_playlist(is_playlist_url(url));

        tokio::select! {
            result = self.backend.extract(url, &config) => result,
            _ = self.console.interrupted() => Err(DownloadError::Interrupted),
        }
    }

    async fn extract(&mut self, url: String) -> SessionState {
        println!("\n[*] Fetching information ...");

        let mut result = self.fetch(&url).await;
        if let Err(e) = &result {
            if e.is_certificate_error() && self.context.proxy.is_some() {
                println!("[!] Proxy certificate rejected, retrying without proxy ...");
                self.context.downgrade_to_direct();
                result = self.fetch(&url).await;
            }
        }

        match result {
            Ok(info) => SessionState::AwaitingSelection { url, info },
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "extraction failed");
                println!("[!] Error fetching info: {}", e);
                if !matches!(e, DownloadError::Interrupted) {
                    let report = describe_failure(&e.to_string(), self.context.proxy.as_deref());
                    println!("    {}", report);
                }
                SessionState::AwaitingUrl
            }
        }
    }

    fn show_info(&self, info: &MediaInfo, options: &[QualityOption]) {
        println!("\n  Title    : {}", info.title);
        if info.duration_seconds > 0 {
            println!("  Duration : {}", info.duration_label());
        }
        if let Some(playlist) = &info.playlist {
            println!("  Type     : PLAYLIST \"{}\" ({} items)", playlist.title, playlist.count);
        }
        if !info.subtitles.is_empty() {
            println!("  Subtitles: {}", info.subtitles.join(", "));
        }
        if !info.automatic_captions.is_empty() {
            println!("  Auto subs: {} languages", info.automatic_captions.len());
        }

        println!("\n  {:<4} {:<22} {}", "#", "Option", "Size");
        println!("  {}", "-".repeat(40));
        for (idx, option) in options.iter().enumerate() {
            let size = option.variant.as_ref().and_then(|v| v.effective_size());
            println!("  {:<4} {:<22} {}", idx + 1, option.label, size_label(size));
        }
    }

    async fn select(&mut self, url: String, info: MediaInfo) -> SessionState {
        let options = menu_options(&info);
        self.show_info(&info, &options);

        let option = loop {
            let answer = match self.ask("\n  Selection (number, 'u' new URL, 'q' quit): ").await {
                Some(a) => a.to_lowercase(),
                None => return SessionState::Exit(0),
            };

            if is_quit(&answer) {
                return SessionState::Exit(0);
            }
            if answer == "u" {
                return SessionState::AwaitingUrl;
            }

            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => break options[n - 1].clone(),
                _ => println!("  [!] Invalid selection."),
            }
        };

        let output_dir = match self.ask("  Output folder [.]: ").await {
            Some(dir) if dir.is_empty() => ".".to_string(),
            Some(dir) => dir,
            None => return SessionState::Exit(0),
        };

        SessionState::Downloading(Box::new(Selection {
            option,
            info,
            url,
            proxy: self.context.proxy.clone(),
            output_dir,
        }))
    }

    async fn download(&mut self, selection: Selection) -> SessionState {
        let request = selection.to_request(&self.config.merge_output_format, self.ffmpeg.as_ref());
        if request.extract_audio {
            println!("[*] Mode: {}", AUDIO_MENU_LABEL);
        } else {
            println!("[*] Mode: Video ({})", selection.option.label);
        }
        tracing::info!(url = %request.url, format = %request.format, "starting download");

        let on_progress = report_progress;
        let result = tokio::select! {
            result = self.backend.download(&request, &on_progress) => result,
            _ = self.console.interrupted() => Err(DownloadError::Interrupted),
        };

        match result {
            Ok(()) => {
                println!("\n[+] Done.");
                SessionState::AwaitingContinue
            }
            Err(e) => {
                tracing::warn!(error = %e, "download failed");
                println!("\n[!] Download failed: {}", e);
                SessionState::AwaitingUrl
            }
        }
    }

    async fn await_continue(&mut self) -> SessionState {
        match self.ask("\nDownload another? (y/N): ").await {
            Some(answer) if matches!(answer.to_lowercase().as_str(), "y" | "yes") => {
                SessionState::AwaitingUrl
            }
            _ => SessionState::Exit(0),
        }
    }
}
