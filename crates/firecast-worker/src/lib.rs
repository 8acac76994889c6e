//! Reference worker for the Firecast job queue.
//!
//! This crate provides:
//! - An HTTP client for the lease/done/fail endpoints
//! - Audio extraction through `yt-dlp`
//! - Upload and playlist assignment through AzuraCast
//! - A polling executor with graceful shutdown

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod executor;
pub mod processor;

pub use client::QueueClient;
pub use config::WorkerConfig;
pub use download::Downloader;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use processor::JobProcessor;
