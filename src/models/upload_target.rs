//! Describes what to upload and where to put it.

use std::path::{Path, PathBuf};

/// Immutable description of one upload, owned by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTarget {
    /// Local file to send.
    pub source: PathBuf,

    /// Name to give the remote entry; defaults to the source base name.
    pub display_name: Option<String>,

    /// Folder (by name) to place the entry in; created when missing.
    pub folder_name: Option<String>,
}

impl UploadTarget {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            display_name: None,
            folder_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder_name = Some(folder.into());
        self
    }

    /// Remote name for the upload: the override when given, else the
    /// source's base name.
    pub fn remote_name(&self) -> String {
        match self.display_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => base_name(&self.source),
        }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
