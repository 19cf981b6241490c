//! The seam between upload logic and the remote storage service.
//!
//! Everything above this trait talks in typed requests and outcomes; the
//! HTTP details live in [`crate::services::http_api`].

use crate::{
    errors::ApiResult,
    models::remote_file::{ChunkOutcome, FileMetadata, RemoteFileEntry, SessionHandle},
};
use bytes::Bytes;
use std::future::Future;

/// Authenticated access to a remote file-storage account.
pub trait DriveApi {
    /// Run an index query and return matches in the remote's own order.
    fn list(&self, query: &str) -> impl Future<Output = ApiResult<Vec<RemoteFileEntry>>> + Send;

    /// Create a metadata-only entry (used for folders).
    fn create(
        &self,
        metadata: &FileMetadata,
    ) -> impl Future<Output = ApiResult<RemoteFileEntry>> + Send;

    /// Open a resumable upload session for `size` bytes.
    fn open_session(
        &self,
        metadata: &FileMetadata,
        size: u64,
    ) -> impl Future<Output = ApiResult<SessionHandle>> + Send;

    /// Send the bytes starting at `offset` and report what the remote now holds.
    ///
    /// An empty `chunk` asks the remote for its current status.
    fn send_chunk(
        &self,
        session: &SessionHandle,
        offset: u64,
        chunk: Bytes,
        total_size: u64,
    ) -> impl Future<Output = ApiResult<ChunkOutcome>> + Send;
}

/// Quote a value for use inside an index query string.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
