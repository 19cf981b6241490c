//! Core data models for the uploader.
//!
//! Remote-facing types serialize with the storage API's camelCase field
//! names via `serde`; local types describe one upload and its progress.

pub mod progress;
pub mod remote_file;
pub mod upload_target;
