//! Remote file and managed folder types

use serde::{Deserialize, Serialize};

/// Name of the single remote folder CloudTray creates and reuses
pub const APP_FOLDER_NAME: &str = "CloudTray";

/// Base URL for opening a Drive folder in the browser
const FOLDER_WEB_BASE: &str = "https://drive.google.com/drive/folders";

/// A file stored in the managed folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider-specific file id
    pub id: String,
    /// File name as stored remotely
    pub name: String,
    /// Shareable link to view the file
    #[serde(rename = "webViewLink")]
    pub view_link: String,
}

impl RemoteFile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        view_link: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            view_link: view_link.into(),
        }
    }
}

/// Entry in the recent uploads listing
pub type RecentFile = RemoteFile;

/// Handle to the managed folder
///
/// Lazily created on first use and fetched afterwards; the backend gives
/// get-or-create semantics so concurrent callers may race harmlessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderHandle {
    pub id: String,
    pub name: String,
}

impl FolderHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Browser URL for the folder, shown in the settings view
    pub fn web_url(&self) -> String {
        format!("{}/{}", FOLDER_WEB_BASE, self.id)
    }
}
