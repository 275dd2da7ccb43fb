// InfoExtractor module - runs yt-dlp for metadata and downloads
//
// Two ways of invoking yt-dlp:
// - Python mode: `python3 -m yt_dlp` (what the dependency installer provides)
// - CLI mode: the native `yt-dlp` binary
//
// The orchestrator picks one according to ExtractorMode and falls back to
// the other when the tool itself is missing or cannot be started.

mod cli;
mod diagnostics;
mod orchestrator;
mod python;
mod traits;

pub use cli::CliInfoExtractor;
pub use diagnostics::{describe_failure, diagnose_error, BlockingReason};
pub use orchestrator::InfoExtractorOrchestrator;
pub use python::PythonInfoExtractor;
pub use traits::{ExtractorConfig, ExtractorMode, InfoExtractor, ProgressCallback};
