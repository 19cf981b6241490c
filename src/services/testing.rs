//! Scripted in-memory `DriveApi` and progress sink used by unit tests.

use crate::{
    errors::{ApiError, ApiResult},
    models::{
        progress::ProgressReport,
        remote_file::{ChunkOutcome, FileMetadata, RemoteFileEntry, SessionHandle},
    },
    services::{drive_api::DriveApi, progress_sink::ProgressSink},
};
use bytes::Bytes;
use std::{collections::VecDeque, sync::Mutex};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct ChunkCall {
    pub offset: u64,
    pub len: usize,
    pub at: Instant,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub queries: Vec<String>,
    pub created: Vec<FileMetadata>,
    pub opened: Vec<(FileMetadata, u64)>,
    pub chunks: Vec<ChunkCall>,
}

/// Replays queued responses in order. An exhausted chunk script answers
/// with a protocol error so runaway loops fail loudly.
#[derive(Default)]
pub struct ScriptedApi {
    listings: Mutex<VecDeque<ApiResult<Vec<RemoteFileEntry>>>>,
    creates: Mutex<VecDeque<ApiResult<RemoteFileEntry>>>,
    sessions: Mutex<VecDeque<ApiResult<SessionHandle>>>,
    chunks: Mutex<VecDeque<ApiResult<ChunkOutcome>>>,
    pub calls: Mutex<Calls>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(self, result: ApiResult<Vec<RemoteFileEntry>>) -> Self {
        self.listings.lock().unwrap().push_back(result);
        self
    }

    pub fn created(self, result: ApiResult<RemoteFileEntry>) -> Self {
        self.creates.lock().unwrap().push_back(result);
        self
    }

    pub fn session(self, result: ApiResult<SessionHandle>) -> Self {
        self.sessions.lock().unwrap().push_back(result);
        self
    }

    pub fn chunk(self, result: ApiResult<ChunkOutcome>) -> Self {
        self.chunks.lock().unwrap().push_back(result);
        self
    }

    pub fn progress(self, bytes_transferred: u64, total_size: u64) -> Self {
        self.chunk(Ok(ChunkOutcome::Progress {
            bytes_transferred,
            total_size,
        }))
    }

    pub fn terminal(self, id: &str) -> Self {
        self.chunk(Ok(ChunkOutcome::Terminal(RemoteFileEntry::with_id(id))))
    }

    pub fn chunk_calls(&self) -> Vec<ChunkCall> {
        self.calls.lock().unwrap().chunks.clone()
    }
}

impl DriveApi for ScriptedApi {
    async fn list(&self, query: &str) -> ApiResult<Vec<RemoteFileEntry>> {
        self.calls.lock().unwrap().queries.push(query.to_string());
        self.listings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create(&self, metadata: &FileMetadata) -> ApiResult<RemoteFileEntry> {
        self.calls.lock().unwrap().created.push(metadata.clone());
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Protocol("no scripted create".into())))
    }

    async fn open_session(&self, metadata: &FileMetadata, size: u64) -> ApiResult<SessionHandle> {
        self.calls
            .lock()
            .unwrap()
            .opened
            .push((metadata.clone(), size));
        self.sessions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SessionHandle("session-1".into())))
    }

    async fn send_chunk(
        &self,
        _session: &SessionHandle,
        offset: u64,
        chunk: Bytes,
        _total_size: u64,
    ) -> ApiResult<ChunkOutcome> {
        self.calls.lock().unwrap().chunks.push(ChunkCall {
            offset,
            len: chunk.len(),
            at: Instant::now(),
        });
        self.chunks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Protocol("chunk script exhausted".into())))
    }
}

/// Keeps every report it observes.
#[derive(Default)]
pub struct RecordingSink {
    pub reports: Mutex<Vec<ProgressReport>>,
}

impl ProgressSink for RecordingSink {
    fn observe(&self, report: &ProgressReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

/// Write `len` patterned bytes to a temp file.
pub fn source_file(len: usize) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    file.write_all(&data).unwrap();
    file.flush().unwrap();
    file
}
