//! Business-logic services, decoupled from the CLI display layer.

pub mod download;

pub use download::{BatchError, DownloadConfig, DownloadEvent, DownloadResult, DownloadService};
