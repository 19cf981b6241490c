//! Resumable chunked upload state machine.
//!
//! One upload moves `NotStarted → InProgress → {Completed | Aborted}`. The
//! first round-trip opens the session; every later one sends the chunk that
//! starts at the remote-confirmed offset. Round-trips are strictly
//! sequential because the remote confirms offsets between chunks.

use crate::{
    config::UploadConfig,
    errors::{ApiResult, FailureClass, UploadError},
    models::{
        progress::{ChunkProgress, ProgressReport},
        remote_file::{ChunkOutcome, FileMetadata, RemoteFileEntry, SessionHandle},
    },
    services::{drive_api::DriveApi, progress_sink::ProgressSink},
};
use bytes::Bytes;
use std::{
    io::{self, ErrorKind, SeekFrom},
    path::Path,
};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a successful round-trip produced.
enum Step {
    Opened(SessionHandle),
    Chunk(ChunkOutcome),
}

/// Upload `source` through a resumable session and return the created entry.
///
/// The file handle is held for the whole transfer and released on every
/// exit path. `cancel` is honoured before each round-trip and during backoff.
pub async fn upload_resumable<A: DriveApi>(
    api: &A,
    source: &Path,
    mut metadata: FileMetadata,
    config: &UploadConfig,
    sink: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<RemoteFileEntry, UploadError> {
    let (mut file, total) = open_source(source).await?;
    if metadata.mime_type.is_none() {
        metadata.mime_type = Some(config.mime_type.clone());
    }
    let chunk_size = config.chunk_size.max(1) as u64;
    let policy = &config.retry;

    debug!(
        "Prepare file to upload [{}] mime[{:?}] chunk[{}] metadata[{:?}]",
        source.display(),
        metadata.mime_type,
        chunk_size,
        metadata
    );
    info!("Upload : {}, Size : {}", source.display(), total);

    let mut progress = ChunkProgress::new(total);
    let mut session: Option<SessionHandle> = None;
    // Next byte to send, as last confirmed by the remote.
    let mut offset: u64 = 0;
    let mut last_failure = String::from("no progress");

    let result = loop {
        if cancel.is_cancelled() {
            warn!("Upload [{}] cancelled", source.display());
            break Err(UploadError::Cancelled {
                bytes_transferred: progress.bytes_transferred(),
            });
        }
        if policy.exhausted(progress.idle_count()) {
            error!("Upload [{}] reached max idle retries", source.display());
            break Err(UploadError::RetryExhausted {
                retries: progress.idle_count(),
                last_failure,
                bytes_transferred: progress.bytes_transferred(),
            });
        }

        let step: ApiResult<Step> = match &session {
            None => api.open_session(&metadata, total).await.map(Step::Opened),
            Some(handle) => {
                let chunk = match read_chunk(&mut file, offset, chunk_size, total).await {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        error!("Upload [{}] failed reading source: {}", source.display(), err);
                        break Err(UploadError::Io {
                            bytes_transferred: progress.bytes_transferred(),
                            source: err,
                        });
                    }
                };
                api.send_chunk(handle, offset, chunk, total)
                    .await
                    .map(Step::Chunk)
            }
        };

        match step {
            Ok(Step::Opened(handle)) => {
                debug!("Upload [{}] session opened", source.display());
                session = Some(handle);
            }
            Ok(Step::Chunk(ChunkOutcome::Terminal(entry))) => {
                sink.observe(&ProgressReport {
                    bytes_done: total,
                    total,
                    elapsed: progress.elapsed(),
                });
                break Ok(entry);
            }
            Ok(Step::Chunk(ChunkOutcome::Progress {
                bytes_transferred,
                total_size,
            })) => {
                if total_size != total {
                    warn!(
                        "Upload [{}] remote reports total {} but file has {}",
                        source.display(),
                        total_size,
                        total
                    );
                }
                offset = bytes_transferred.min(total);
                if progress.record(bytes_transferred) {
                    sink.observe(&progress.report());
                } else {
                    last_failure = String::from("no progress from last chunk");
                    warn!(
                        "Upload [{}] retry [{}] next chunk: no progress from last chunk",
                        source.display(),
                        progress.idle_count()
                    );
                }
            }
            Ok(Step::Chunk(ChunkOutcome::Ambiguous)) => {
                let idle = progress.mark_idle();
                last_failure = String::from("response carried no status");
                warn!(
                    "Upload [{}] retry [{}] next chunk: response carried no status",
                    source.display(),
                    idle
                );
            }
            Err(err) => match policy.classify(&err) {
                FailureClass::Transient => {
                    let idle = progress.mark_idle();
                    warn!(
                        "Upload [{}] {} failure, retry [{}]: {}",
                        source.display(),
                        FailureClass::Transient,
                        idle,
                        err
                    );
                    last_failure = err.to_string();
                    if policy.exhausted(idle) {
                        continue;
                    }
                    let delay = policy.delay(idle);
                    debug!("Upload [{}] backing off for {:?}", source.display(), delay);
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                class => {
                    error!(
                        "Upload [{}] {} failure, not retrying: {}",
                        source.display(),
                        class,
                        err
                    );
                    break Err(UploadError::aborted(
                        class,
                        &err,
                        progress.bytes_transferred(),
                    ));
                }
            },
        }
    };

    sink.finish();
    let elapsed = progress.elapsed().as_secs_f64();
    match &result {
        Ok(entry) => info!(
            "Upload {} Complete! -- {:.2} seconds, id {}",
            source.display(),
            elapsed,
            entry.id
        ),
        Err(err) => error!(
            "Upload {} Error! -- {:.2} seconds: {}",
            source.display(),
            elapsed,
            err
        ),
    }
    result
}

/// Open the source and capture its size once.
async fn open_source(source: &Path) -> Result<(File, u64), UploadError> {
    let not_found = |err: io::Error| {
        error!("Error {} : source file not found: {}", source.display(), err);
        UploadError::SourceNotFound {
            path: source.to_path_buf(),
            source: err,
        }
    };

    let file = File::open(source).await.map_err(not_found)?;
    let meta = file.metadata().await.map_err(not_found)?;
    if !meta.is_file() {
        return Err(not_found(io::Error::new(
            ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok((file, meta.len()))
}

/// Read up to `chunk_size` bytes starting at `offset`.
///
/// At or past the end this yields an empty chunk, which asks the remote
/// for its status.
async fn read_chunk(
    file: &mut File,
    offset: u64,
    chunk_size: u64,
    total: u64,
) -> io::Result<Bytes> {
    let len = total.saturating_sub(offset).min(chunk_size) as usize;
    let mut buf = vec![0u8; len];
    if len > 0 {
        file.seek(SeekFrom::Start(offset)).await?;
        file.read_exact(&mut buf).await?;
    }
    Ok(Bytes::from(buf))
}
