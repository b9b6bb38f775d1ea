use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::ValidationError;
use crate::segmenter::effective_segment_count;

/// Output file name used when none is given.
pub const DEFAULT_OUTPUT: &str = "output";
/// Bytes moved from a response body to the output file per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;
/// libcurl refuses receive buffers outside this range.
pub const MIN_CHUNK_SIZE: usize = 1024;
pub const MAX_CHUNK_SIZE: usize = 512 * 1024;

/// Defaults loaded from `~/.config/segfetch/config.toml`. Command-line flags override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegfetchConfig {
    /// Concurrent connections (workers) per download.
    pub connections: usize,
    /// Requested segment count; 0 means one segment per connection.
    pub segments: usize,
    /// Output file path.
    pub output: PathBuf,
    /// Receive chunk size in bytes.
    pub chunk_size: usize,
    /// Connect timeout for HEAD and range requests.
    pub connect_timeout_secs: u64,
    /// Abort a transfer whose throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Reserve the full file size on disk before writing.
    pub preallocate: bool,
}

impl Default for SegfetchConfig {
    fn default() -> Self {
        Self {
            connections: 1,
            segments: 0,
            output: PathBuf::from(DEFAULT_OUTPUT),
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            preallocate: true,
        }
    }
}

impl SegfetchConfig {
    /// Per-run configuration for `url` using these defaults.
    pub fn fetch_config(&self, url: impl Into<String>) -> FetchConfig {
        FetchConfig {
            url: url.into(),
            output_path: self.output.clone(),
            segment_count: self.segments,
            connection_count: self.connections,
            chunk_size: self.chunk_size,
            preallocate: self.preallocate,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SegfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SegfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SegfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Configuration of a single download run, built once and passed to the engine.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub url: String,
    pub output_path: PathBuf,
    /// Requested segment count; 0 = auto (one per connection).
    pub segment_count: usize,
    pub connection_count: usize,
    pub chunk_size: usize,
    pub preallocate: bool,
}

impl FetchConfig {
    /// Run configuration for `url` with built-in defaults.
    pub fn new(url: impl Into<String>) -> Self {
        SegfetchConfig::default().fetch_config(url)
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        let parsed = url::Url::parse(url).map_err(|source| ValidationError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
        }
        effective_segment_count(self.segment_count, self.connection_count)?;
        if self.output_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyOutputPath);
        }
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ValidationError::ChunkSize {
                got: self.chunk_size,
                min: MIN_CHUNK_SIZE,
                max: MAX_CHUNK_SIZE,
            });
        }
        Ok(())
    }
}

/// Converts signed counts (as typed on a command line) into `(segments, connections)`.
pub fn checked_counts(segments: i64, connections: i64) -> Result<(usize, usize), ValidationError> {
    if connections < 1 {
        return Err(ValidationError::ConnectionCount(connections));
    }
    if segments < 0 {
        return Err(ValidationError::SegmentCount(segments));
    }
    let connections =
        usize::try_from(connections).map_err(|_| ValidationError::ConnectionCount(connections))?;
    let segments = usize::try_from(segments).map_err(|_| ValidationError::SegmentCount(segments))?;
    Ok((segments, connections))
}
