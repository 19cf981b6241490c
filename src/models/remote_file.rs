//! Entries and handles exchanged with the remote storage API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mime type the remote uses to mark an entry as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A file or folder as reported by the remote index.
///
/// The upload engine treats this as an opaque success token; callers may
/// read whatever fields the remote chose to return.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileEntry {
    /// Remote identifier.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Parent folder identifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// Size in bytes. The remote encodes it as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_checksum: Option<String>,
}

impl RemoteFileEntry {
    /// Minimal entry carrying only an identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            mime_type: None,
            parents: Vec::new(),
            size: None,
            created_time: None,
            md5_checksum: None,
        }
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Listing envelope returned by the remote `files.list` call.
#[derive(Deserialize, Debug, Default)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<RemoteFileEntry>,
}

/// Identifier of a remote folder, resolved once per upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderHandle(pub String);

impl FolderHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Metadata sent when creating a remote entry.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl FileMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            parents: Vec::new(),
        }
    }

    /// Metadata describing a folder named `name`.
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: Vec::new(),
        }
    }

    /// Place the entry inside `parent`.
    pub fn with_parent(mut self, parent: FolderHandle) -> Self {
        self.parents.push(parent.0);
        self
    }
}

/// Handle of an open resumable upload session (the session URI).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionHandle(pub String);

/// Outcome of one successful chunk round-trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The remote confirmed `bytes_transferred` of `total_size` so far.
    Progress {
        bytes_transferred: u64,
        total_size: u64,
    },
    /// The remote holds the whole file and created this entry.
    Terminal(RemoteFileEntry),
    /// Neither a status nor a terminal entry came back.
    Ambiguous,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_decodes_remote_field_names() {
        let raw = r#"{
            "id": "abc",
            "name": "report.pdf",
            "mimeType": "application/pdf",
            "parents": ["F1"],
            "size": "4096",
            "createdTime": "2024-03-01T10:00:00.000Z",
            "md5Checksum": "d41d8cd98f00b204e9800998ecf8427e"
        }"#;
        let entry: RemoteFileEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.id, "abc");
        assert_eq!(entry.parents, vec!["F1".to_string()]);
        assert_eq!(entry.size_bytes(), Some(4096));
        assert!(entry.created_time.is_some());
    }

    #[test]
    fn entry_tolerates_missing_fields() {
        let entry: RemoteFileEntry = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(entry, RemoteFileEntry::with_id("x"));
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
    }

    #[test]
    fn folder_metadata_serializes_folder_mime_type() {
        let body = serde_json::to_value(FileMetadata::folder("backups")).unwrap();
        assert_eq!(body["name"], "backups");
        assert_eq!(body["mimeType"], FOLDER_MIME_TYPE);
        assert!(body.get("parents").is_none());
    }

    #[test]
    fn parent_is_serialized_when_set() {
        let meta = FileMetadata::new("a.bin").with_parent(FolderHandle("F1".into()));
        let body = serde_json::to_value(meta).unwrap();
        assert_eq!(body["parents"], serde_json::json!(["F1"]));
    }
}
