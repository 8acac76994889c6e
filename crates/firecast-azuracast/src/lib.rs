//! Client for the AzuraCast radio station API.
//!
//! This crate provides:
//! - Playlist listing as a `{name: id}` map
//! - Media upload (base64 JSON body)
//! - Playlist assignment for uploaded media

pub mod client;
pub mod error;
pub mod types;

pub use client::{AzuraCastClient, AzuraCastConfig};
pub use error::{AzuraCastError, AzuraCastResult};
pub use types::{PlaylistAssignment, PlaylistEntry, UploadRequest, UploadResponse};
