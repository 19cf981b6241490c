//! Advisory lookup of an existing remote file by name.

use crate::{
    models::remote_file::{FolderHandle, RemoteFileEntry},
    services::drive_api::{DriveApi, quote},
};
use tracing::{debug, warn};

/// Query matching entries named `filename`, optionally inside `parent`.
pub fn file_query(filename: &str, parent: Option<&FolderHandle>) -> String {
    match parent {
        Some(parent) => format!(
            "name = {} and {} in parents",
            quote(filename),
            quote(parent.as_str())
        ),
        None => format!("name = {}", quote(filename)),
    }
}

/// First remote entry matching `filename` (and `parent`, when given).
///
/// The remote does not enforce unique names, so this is a hint only. A
/// failed query is logged and reported as no match.
pub async fn find_file<A: DriveApi>(
    api: &A,
    filename: &str,
    parent: Option<&FolderHandle>,
) -> Option<RemoteFileEntry> {
    let query = file_query(filename, parent);
    debug!("Check file on remote: q=[{}]", query);
    match api.list(&query).await {
        Ok(entries) => {
            let found = entries.into_iter().next();
            debug!("File lookup for [{}] in [{:?}]: {:?}", filename, parent, found);
            found
        }
        Err(err) => {
            warn!("File lookup for [{}] failed, assuming no match: {}", filename, err);
            None
        }
    }
}
