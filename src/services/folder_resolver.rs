//! Find-or-create of a destination folder by name.
//!
//! Not race-safe: two uploaders resolving the same missing name at once may
//! each create a folder. Single-uploader use is assumed.

use crate::{
    errors::ApiResult,
    models::remote_file::{FOLDER_MIME_TYPE, FileMetadata, FolderHandle},
    services::drive_api::{DriveApi, quote},
};
use tracing::{debug, error};

/// Query matching live folders named exactly `folder_name`.
pub fn folder_query(folder_name: &str) -> String {
    format!(
        "name = {} and trashed != true and mimeType = {}",
        quote(folder_name),
        quote(FOLDER_MIME_TYPE)
    )
}

/// Return the id of the folder named `folder_name`, creating it when absent.
///
/// With several matches the first one in the remote's ordering wins.
pub async fn resolve_or_create_folder<A: DriveApi>(
    api: &A,
    folder_name: &str,
) -> ApiResult<FolderHandle> {
    let query = folder_query(folder_name);
    let found = api.list(&query).await.inspect_err(|err| {
        error!("Folder lookup for [{}] failed: {}", folder_name, err);
    })?;

    if let Some(first) = found.into_iter().next() {
        debug!("Found folder [{}]: {}", folder_name, first.id);
        return Ok(FolderHandle(first.id));
    }

    debug!("Folder [{}] not found, creating it", folder_name);
    let created = api
        .create(&FileMetadata::folder(folder_name))
        .await
        .inspect_err(|err| {
            error!("Creating folder [{}] failed: {}", folder_name, err);
        })?;
    debug!("Created folder [{}]: {}", folder_name, created.id);
    Ok(FolderHandle(created.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::ApiError, models::remote_file::RemoteFileEntry, services::testing::ScriptedApi,
    };

    #[tokio::test]
    async fn existing_folder_is_reused_without_create() {
        let api = ScriptedApi::new().listing(Ok(vec![
            RemoteFileEntry::with_id("F0"),
            RemoteFileEntry::with_id("F9"),
        ]));

        let handle = resolve_or_create_folder(&api, "backups").await.unwrap();

        assert_eq!(handle, FolderHandle("F0".into()));
        let calls = api.calls.lock().unwrap();
        assert!(calls.created.is_empty());
        assert_eq!(calls.queries, vec![folder_query("backups")]);
    }

    #[tokio::test]
    async fn missing_folder_is_created_once() {
        let api = ScriptedApi::new()
            .listing(Ok(vec![]))
            .created(Ok(RemoteFileEntry::with_id("F1")));

        let handle = resolve_or_create_folder(&api, "backups").await.unwrap();

        assert_eq!(handle.as_str(), "F1");
        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.created, vec![FileMetadata::folder("backups")]);
    }

    #[tokio::test]
    async fn lookup_failure_is_propagated_without_create() {
        let api = ScriptedApi::new().listing(Err(ApiError::status(500, "backend error")));

        let err = resolve_or_create_folder(&api, "backups").await.unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        assert!(api.calls.lock().unwrap().created.is_empty());
    }

    #[tokio::test]
    async fn create_failure_is_propagated() {
        let api = ScriptedApi::new()
            .listing(Ok(vec![]))
            .created(Err(ApiError::Connection("reset".into())));

        assert!(resolve_or_create_folder(&api, "backups").await.is_err());
    }

    #[test]
    fn query_filters_trashed_and_non_folders() {
        assert_eq!(
            folder_query("my 'stuff'"),
            r"name = 'my \'stuff\'' and trashed != true and mimeType = 'application/vnd.google-apps.folder'"
        );
    }
}
