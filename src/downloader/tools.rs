// Tool manager - locates yt-dlp, installs it when missing, resolves ffmpeg

use std::path::{Path, PathBuf};
use std::process::Command;

use super::errors::DownloadError;
use super::utils::{command_succeeds, which};

const APP_DIR: &str = "ytfetch";

// Binary locations checked before falling back to PATH
const COMMON_BIN_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

// Prints the bundled ffmpeg path once the package has set up its binaries
const STATIC_FFMPEG_SNIPPET: &str =
    "import static_ffmpeg.run as r; print(r.get_or_fetch_platform_executables_else_raise()[0])";

fn bin_name(tool: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.exe", tool)
    } else {
        tool.to_string()
    }
}

/// `<data_dir>/ytfetch/bin`, where manually placed tools are picked up
pub fn managed_bin_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR).join("bin"))
}

/// Python interpreter to use: `YTDLP_PYTHON`, else the first that runs
pub fn python_cmd() -> String {
    if let Ok(custom) = std::env::var("YTDLP_PYTHON") {
        if !custom.trim().is_empty() {
            return custom;
        }
    }

    ["python3", "python"]
        .iter()
        .find(|candidate| command_succeeds(candidate, &["--version"]))
        .map(|c| c.to_string())
        .unwrap_or_else(|| "python3".to_string())
}

/// Whether `python -c "import <module>"` succeeds
pub fn python_has_module(python: &str, module: &str) -> bool {
    command_succeeds(python, &["-c", &format!("import {}", module)])
}

fn find_in(dirs: impl IntoIterator<Item = PathBuf>, name: &str) -> Option<PathBuf> {
    dirs.into_iter().map(|d| d.join(name)).find(|p| p.is_file())
}

/// Path of the yt-dlp binary, or plain `yt-dlp` to let the OS resolve it
pub fn find_ytdlp() -> String {
    let name = bin_name("yt-dlp");
    let common = COMMON_BIN_DIRS.iter().map(PathBuf::from);

    find_in(common, &name)
        .or_else(|| which(&name))
        .or_else(|| find_in(managed_bin_dir(), &name))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or(name)
}

fn pip_install(python: &str, package: &str) -> Result<(), DownloadError> {
    println!("[!] {} not found. Installing...", package);
    tracing::info!(python, package, "installing with pip");

    let status = Command::new(python)
        .args(["-m", "pip", "install", "-U", package])
        .status()
        .map_err(|e| DownloadError::ToolNotFound(format!("{}: {}", python, e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(DownloadError::ExecutionError(format!(
            "pip install {} exited with {}",
            package, status
        )))
    }
}

/// Make sure some form of yt-dlp can run, installing the module if needed
pub fn ensure_ytdlp() -> Result<(), DownloadError> {
    let python = python_cmd();
    if python_has_module(&python, "yt_dlp") {
        tracing::debug!(python = %python, "yt_dlp module present");
        return Ok(());
    }

    let binary = find_ytdlp();
    if command_succeeds(&binary, &["--version"]) {
        tracing::debug!(binary = %binary, "yt-dlp binary present");
        return Ok(());
    }

    pip_install(&python, "yt-dlp")?;
    if python_has_module(&python, "yt_dlp") {
        Ok(())
    } else {
        Err(DownloadError::ToolNotFound(
            "yt_dlp still not importable after installation".to_string(),
        ))
    }
}

fn static_ffmpeg_path(python: &str) -> Option<PathBuf> {
    if !python_has_module(python, "static_ffmpeg") {
        pip_install(python, "static-ffmpeg").ok()?;
    }

    let output = Command::new(python)
        .args(["-c", STATIC_FFMPEG_SNIPPET])
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::warn!(
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "static-ffmpeg could not provide a binary"
        );
        return None;
    }

    let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    path.is_file().then_some(path)
}

/// ffmpeg lookup order: PATH, the managed bin dir, the static-ffmpeg package
pub fn resolve_ffmpeg() -> Option<PathBuf> {
    let name = bin_name("ffmpeg");

    if let Some(path) = which(&name) {
        tracing::info!(path = %path.display(), "ffmpeg found on PATH");
        return Some(path);
    }

    if let Some(path) = find_in(managed_bin_dir(), &name) {
        tracing::info!(path = %path.display(), "ffmpeg found in managed dir");
        return Some(path);
    }

    let path = static_ffmpeg_path(&python_cmd());
    match &path {
        Some(p) => tracing::info!(path = %p.display(), "ffmpeg provided by static-ffmpeg"),
        None => tracing::warn!("ffmpeg not available"),
    }
    path
}

/// Directory holding the ffmpeg binary, the form yt-dlp accepts for --ffmpeg-location
pub fn ffmpeg_location(ffmpeg: &Path) -> String {
    ffmpeg
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(ffmpeg)
        .to_string_lossy()
        .to_string()
}
