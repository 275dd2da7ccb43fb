pub mod config;
pub mod downloader;
pub mod logging;
pub mod session;

use std::io::Write;

use config::AppConfig;
use downloader::extractors::InfoExtractorOrchestrator;
use downloader::proxy::probe_proxy;
use downloader::tools::{ensure_ytdlp, resolve_ffmpeg};
use session::{Session, SessionContext, StdConsole};

fn banner() {
    println!("{}", "=".repeat(50));
    println!(" ytfetch - video & playlist downloader");
    println!("{}", "=".repeat(50));
}

/// Startup checks, then the interactive loop. Returns the process exit code.
pub async fn run() -> anyhow::Result<i32> {
    banner();
    let config = AppConfig::from_env();
    tracing::info!(?config, "starting");

    if let Err(e) = ensure_ytdlp() {
        tracing::error!(error = %e, "yt-dlp unavailable");
        println!("[!] yt-dlp is not available and could not be installed: {}", e);
        return Ok(1);
    }

    let ffmpeg = resolve_ffmpeg();
    if ffmpeg.is_none() {
        println!("[!] ffmpeg not found: merging and MP3 conversion will fail.");
    }

    let proxy = match &config.proxy.endpoint {
        Some(endpoint) => {
            print!("[*] Checking proxy {} ... ", endpoint);
            let _ = std::io::stdout().flush();
            let proxy = probe_proxy(&config.proxy).await;
            match proxy {
                Some(_) => println!("available."),
                None => println!("unreachable, using direct mode."),
            }
            proxy
        }
        None => None,
    };

    let backend = InfoExtractorOrchestrator::new(config.extractor.mode);
    let mut session = Session::new(StdConsole::new(), &backend, config, SessionContext::new(proxy))
        .with_ffmpeg(ffmpeg);

    Ok(session.run().await)
}
