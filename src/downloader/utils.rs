// Process helpers shared by the extractor implementations

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use super::errors::DownloadError;
use super::extractors::ProgressCallback;
use super::progress::parse_ytdlp_progress;

/// Locate an executable on PATH via `which` (`where` on Windows)
pub fn which(binary: &str) -> Option<PathBuf> {
    let finder = if cfg!(target_os = "windows") { "where" } else { "which" };
    let output = std::process::Command::new(finder).arg(binary).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
}

/// Whether `program args...` runs and exits successfully
pub fn command_succeeds(program: &str, args: &[&str]) -> bool {
    std::process::Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Run a command to completion and return its stdout; stderr becomes the error
pub async fn run_capture(program: &str, args: Vec<String>) -> Result<Vec<u8>, DownloadError> {
    tracing::debug!(program, args = %args.join(" "), "running");

    let output = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| spawn_error(program, e))?;

    if output.status.success() {
        return Ok(output.stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    tracing::debug!(program, status = %output.status, stderr = %stderr.trim(), "command failed");
    if stderr.trim().is_empty() {
        return Err(DownloadError::ExecutionError(format!(
            "{} exited with {}",
            program, output.status
        )));
    }
    Err(DownloadError::from(stderr))
}

/// Run yt-dlp with `--newline`, feeding every recognised stdout line to
/// `on_progress`. The child is killed if the future is dropped.
pub async fn run_streaming(
    program: &str,
    args: Vec<String>,
    on_progress: ProgressCallback<'_>,
) -> Result<(), DownloadError> {
    tracing::info!(program, args = %args.join(" "), "starting download");

    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stdout from {}", program)))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| DownloadError::ExecutionError(format!("Failed to capture stderr from {}", program)))?;

    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        String::from_utf8_lossy(&buf).to_string()
    });

    // Raw bytes: titles are not always valid UTF-8, and the pipe must be
    // drained to EOF or the child blocks on a full buffer
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();
                tracing::trace!(line = %line, "yt-dlp");
                if let Some(event) = parse_ytdlp_progress(line) {
                    on_progress(event);
                }
            }
            Err(e) => {
                tracing::warn!(program, error = %e, "stdout read failed");
                break;
            }
        }
    }
    drop(reader);

    let status = child
        .wait()
        .await
        .map_err(|e| DownloadError::ExecutionError(format!("Process error: {}", e)))?;
    let stderr_output = stderr_task.await.unwrap_or_default();

    if status.success() {
        tracing::info!(program, "download finished");
        return Ok(());
    }

    tracing::warn!(program, status = %status, stderr = %stderr_output.trim(), "download failed");
    if stderr_output.trim().is_empty() {
        Err(DownloadError::ExecutionError(format!("{} exited with {}", program, status)))
    } else {
        Err(DownloadError::from(stderr_output))
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> DownloadError {
    if e.kind() == std::io::ErrorKind::NotFound {
        DownloadError::ToolNotFound(program.to_string())
    } else {
        DownloadError::ExecutionError(format!("Failed to start {}: {}", program, e))
    }
}
