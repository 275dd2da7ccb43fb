// Downloader module - URL cleanup, proxy probe, quality catalog and yt-dlp plumbing

pub mod catalog;
pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod progress;
pub mod proxy;
pub mod tools;
pub mod url;
pub mod utils;

pub use catalog::{build_catalog, AUDIO_ONLY_LABEL};
pub use errors::DownloadError;
pub use extractors::{ExtractorConfig, ExtractorMode, InfoExtractor, InfoExtractorOrchestrator};
pub use format_selector::{FormatSelection, FormatSelector};
pub use models::{DownloadRequest, MediaInfo, QualityOption, StreamVariant};
pub use progress::ProgressEvent;
pub use url::{normalize_url, UrlPolicy};
