//! Resumable uploads of local files to a cloud file-storage account.
//!
//! - `config`: CLI/env configuration and the per-upload [`config::UploadConfig`].
//! - `errors`: remote failures, their classification, and final upload errors.
//! - `models`: upload targets, remote entries, progress state.
//! - `services`: the remote API seam, folder/file lookups, the chunked
//!   upload engine and the orchestrating [`services::uploader::UploadService`].

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
