pub mod config;
pub mod error;
pub mod logging;

pub mod downloader;
pub mod events;
pub mod fetch_head;
pub mod progress;
pub mod scheduler;
pub mod segmenter;
pub mod storage;
pub mod transport;

pub use downloader::{fetch, fetch_async, DownloadReport};
pub use error::FetchError;
