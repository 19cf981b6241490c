//! `DriveApi` over HTTPS with `reqwest`.
//!
//! Metadata calls go to the API base (`/files`), media to the upload base
//! (`/files?uploadType=resumable`). A resumable session is the URI returned
//! in the `Location` header; chunks are `PUT` to it with `Content-Range`,
//! and the remote answers `308` with a `Range` header until it has the
//! whole file, then `200`/`201` with the created entry.

use crate::{
    errors::{ApiError, ApiResult},
    models::remote_file::{ChunkOutcome, FileList, FileMetadata, RemoteFileEntry, SessionHandle},
    services::drive_api::DriveApi,
};
use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{CONTENT_LENGTH, CONTENT_RANGE, LOCATION, RANGE},
    redirect,
};
use std::time::Duration;
use tracing::debug;

/// Fields requested for every returned entry.
const ENTRY_FIELDS: &str = "id,name,mimeType,parents,size,createdTime,md5Checksum";

/// The remote's "resume incomplete" reply to a partial chunk.
const RESUME_INCOMPLETE: u16 = 308;

/// Bearer-authenticated client for one storage account.
#[derive(Clone, Debug)]
pub struct HttpDriveApi {
    client: Client,
    api_base: String,
    upload_base: String,
    token: String,
}

impl HttpDriveApi {
    pub fn new(
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        // 308 is a protocol reply here, never a redirect to follow.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            upload_base: upload_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

impl DriveApi for HttpDriveApi {
    async fn list(&self, query: &str) -> ApiResult<Vec<RemoteFileEntry>> {
        let url = format!("{}/files", self.api_base);
        let fields = format!("files({})", ENTRY_FIELDS);
        let response = self
            .authorize(self.client.get(&url))
            .query(&[("q", query), ("fields", fields.as_str()), ("spaces", "drive")])
            .send()
            .await?;
        let list: FileList = decode(ensure_success(response).await?).await?;
        Ok(list.files)
    }

    async fn create(&self, metadata: &FileMetadata) -> ApiResult<RemoteFileEntry> {
        let url = format!("{}/files", self.api_base);
        let response = self
            .authorize(self.client.post(&url))
            .query(&[("fields", ENTRY_FIELDS)])
            .json(metadata)
            .send()
            .await?;
        decode(ensure_success(response).await?).await
    }

    async fn open_session(&self, metadata: &FileMetadata, size: u64) -> ApiResult<SessionHandle> {
        let url = format!("{}/files", self.upload_base);
        let mut request = self
            .authorize(self.client.post(&url))
            .query(&[("uploadType", "resumable"), ("fields", ENTRY_FIELDS)])
            .header("X-Upload-Content-Length", size.to_string())
            .json(metadata);
        if let Some(mime) = &metadata.mime_type {
            request = request.header("X-Upload-Content-Type", mime.as_str());
        }

        let response = ensure_success(request.send().await?).await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Protocol("session response has no Location header".into()))?;
        debug!("Opened resumable session for {} bytes", size);
        Ok(SessionHandle(location.to_string()))
    }

    async fn send_chunk(
        &self,
        session: &SessionHandle,
        offset: u64,
        chunk: Bytes,
        total_size: u64,
    ) -> ApiResult<ChunkOutcome> {
        let range = content_range(offset, chunk.len() as u64, total_size);
        let response = self
            .authorize(self.client.put(&session.0))
            .header(CONTENT_LENGTH, chunk.len())
            .header(CONTENT_RANGE, range)
            .body(chunk)
            .send()
            .await?;

        match response.status().as_u16() {
            RESUME_INCOMPLETE => {
                let confirmed = response
                    .headers()
                    .get(RANGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(confirmed_bytes)
                    .unwrap_or(0);
                Ok(ChunkOutcome::Progress {
                    bytes_transferred: confirmed,
                    total_size,
                })
            }
            200 | 201 => {
                let body = response.text().await?;
                if body.trim().is_empty() {
                    return Ok(ChunkOutcome::Ambiguous);
                }
                serde_json::from_str(&body)
                    .map(ChunkOutcome::Terminal)
                    .map_err(|err| ApiError::Decode(err.to_string()))
            }
            _ => Err(status_error(response).await),
        }
    }
}

/// `Content-Range` value for `len` bytes at `offset`; an empty chunk asks
/// for status only.
pub fn content_range(offset: u64, len: u64, total: u64) -> String {
    if len == 0 {
        format!("bytes */{}", total)
    } else {
        format!("bytes {}-{}/{}", offset, offset + len - 1, total)
    }
}

/// Byte count confirmed by a `Range: bytes=0-N` reply header.
pub fn confirmed_bytes(range: &str) -> Option<u64> {
    let (_, last) = range.trim().strip_prefix("bytes=")?.split_once('-')?;
    last.trim().parse::<u64>().ok().map(|n| n + 1)
}

async fn ensure_success(response: Response) -> ApiResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response).await)
    }
}

async fn status_error(response: Response) -> ApiError {
    let status: StatusCode = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    ApiError::status(status.as_u16(), message)
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> ApiResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}
