//! Upload orchestration: source check, destination folder, metadata, then
//! the resumable engine. No retries happen at this layer.

use crate::{
    config::UploadConfig,
    errors::UploadError,
    models::{
        remote_file::{FileMetadata, FolderHandle, RemoteFileEntry},
        upload_target::UploadTarget,
    },
    services::{
        drive_api::DriveApi,
        file_lookup::find_file,
        folder_resolver::resolve_or_create_folder,
        progress_sink::{NoProgress, ProgressSink},
        upload_engine::upload_resumable,
    },
};
use std::{
    io::{self, ErrorKind},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

/// Per-call knobs for [`UploadService::upload`].
#[derive(Clone)]
pub struct UploadOptions {
    /// Warn when the destination already holds an entry with the same name.
    pub check_existing: bool,
    pub cancel: CancellationToken,
    pub sink: Arc<dyn ProgressSink>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            check_existing: false,
            cancel: CancellationToken::new(),
            sink: Arc::new(NoProgress),
        }
    }
}

/// Uploads files to one remote account.
pub struct UploadService<A> {
    api: A,
    config: UploadConfig,
}

impl<A: DriveApi> UploadService<A> {
    pub fn new(api: A, config: UploadConfig) -> Self {
        Self { api, config }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Upload `target`, creating its destination folder when needed.
    ///
    /// A failed folder resolution returns before anything is transferred, so
    /// no orphan file is created. The engine's result is returned unchanged.
    pub async fn upload(
        &self,
        target: &UploadTarget,
        options: &UploadOptions,
    ) -> Result<RemoteFileEntry, UploadError> {
        let upload_id = Uuid::new_v4();
        let span = info_span!("upload", %upload_id, file = %target.source.display());
        self.upload_inner(target, options).instrument(span).await
    }

    async fn upload_inner(
        &self,
        target: &UploadTarget,
        options: &UploadOptions,
    ) -> Result<RemoteFileEntry, UploadError> {
        ensure_source_file(target).await?;

        let parent: Option<FolderHandle> = match target.folder_name.as_deref() {
            Some(folder) => Some(
                resolve_or_create_folder(&self.api, folder)
                    .await
                    .map_err(|source| {
                        error!("No folder id resolved for [{}]", folder);
                        UploadError::FolderResolutionFailed {
                            folder: folder.to_string(),
                            source,
                        }
                    })?,
            ),
            None => None,
        };

        let name = target.remote_name();
        if options.check_existing
            && let Some(existing) = find_file(&self.api, &name, parent.as_ref()).await
        {
            warn!(
                "A file named [{}] already exists at the destination ({}); uploading another",
                name, existing.id
            );
        }

        let mut metadata = FileMetadata::new(name);
        if let Some(parent) = parent {
            metadata = metadata.with_parent(parent);
        }

        upload_resumable(
            &self.api,
            &target.source,
            metadata,
            &self.config,
            options.sink.as_ref(),
            &options.cancel,
        )
        .await
    }
}

/// Fail fast on a missing source before touching the remote.
async fn ensure_source_file(target: &UploadTarget) -> Result<(), UploadError> {
    let not_found = |source: io::Error| {
        error!("Error {} : raw file not found", target.source.display());
        UploadError::SourceNotFound {
            path: target.source.clone(),
            source,
        }
    };
    let meta = tokio::fs::metadata(&target.source)
        .await
        .map_err(not_found)?;
    if !meta.is_file() {
        return Err(not_found(io::Error::new(
            ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(())
}
