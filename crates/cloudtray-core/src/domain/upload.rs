//! Upload batch domain types
//!
//! A batch is the set of files submitted together by one drop or one
//! file-picker action. Its mode decides how a failing file is contained.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::files::RemoteFile;

/// Progress value meaning "queued or started, no tick received yet"
pub const STARTED_PERCENT: u8 = 1;

/// Upper bound of a progress value
const COMPLETE_PERCENT: u8 = 100;

// ============================================================================
// Sources and modes
// ============================================================================

/// One file offered for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// In-memory contents, as delivered by drag-and-drop
    Bytes { name: String, content: Vec<u8> },
    /// A filesystem path, as returned by the file picker
    Path(PathBuf),
}

impl UploadSource {
    pub fn bytes(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        UploadSource::Bytes {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        UploadSource::Path(path.into())
    }

    /// Name used as the progress map key
    ///
    /// For paths this is the last segment after either separator, so Windows
    /// paths picked on any platform still yield the bare file name. A path
    /// with no usable segment falls back to the whole string.
    pub fn file_name(&self) -> String {
        match self {
            UploadSource::Bytes { name, .. } => name.clone(),
            UploadSource::Path(path) => {
                let raw = path.to_string_lossy();
                let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();
                if last.is_empty() {
                    raw.into_owned()
                } else {
                    last.to_string()
                }
            }
        }
    }

    pub fn mode(&self) -> UploadMode {
        match self {
            UploadSource::Bytes { .. } => UploadMode::Bytes,
            UploadSource::Path(_) => UploadMode::Path,
        }
    }
}

/// How the files of a batch reach the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// Contents are sent as bytes (drag-and-drop)
    Bytes,
    /// The bridge reads the file from disk (file picker)
    Path,
}

impl UploadMode {
    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            UploadMode::Bytes => FailurePolicy::AbortBatch,
            UploadMode::Path => FailurePolicy::IsolateFile,
        }
    }
}

impl std::fmt::Display for UploadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadMode::Bytes => write!(f, "bytes"),
            UploadMode::Path => write!(f, "path"),
        }
    }
}

/// What happens to the rest of a batch when one file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and report the whole batch as failed
    AbortBatch,
    /// Report the failing file and continue with the next one
    IsolateFile,
}

// ============================================================================
// UploadBatch
// ============================================================================

/// An ordered set of files of a single mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBatch {
    mode: UploadMode,
    files: Vec<UploadSource>,
}

impl UploadBatch {
    /// Batch of in-memory files `(name, contents)`
    pub fn from_bytes<I, N>(files: I) -> Self
    where
        I: IntoIterator<Item = (N, Vec<u8>)>,
        N: Into<String>,
    {
        Self {
            mode: UploadMode::Bytes,
            files: files
                .into_iter()
                .map(|(name, content)| UploadSource::bytes(name, content))
                .collect(),
        }
    }

    /// Batch of filesystem paths
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            mode: UploadMode::Path,
            files: paths.into_iter().map(UploadSource::path).collect(),
        }
    }

    /// Builds a batch from mixed sources, rejecting mixed modes
    pub fn new(mode: UploadMode, files: Vec<UploadSource>) -> Result<Self, DomainError> {
        if let Some(other) = files.iter().find(|f| f.mode() != mode) {
            return Err(DomainError::ValidationFailed(format!(
                "{} source in a {} batch: {}",
                other.mode(),
                mode,
                other.file_name()
            )));
        }
        Ok(Self { mode, files })
    }

    pub fn mode(&self) -> UploadMode {
        self.mode
    }

    pub fn files(&self) -> &[UploadSource] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(UploadSource::file_name).collect()
    }
}

// ============================================================================
// UploadProgressMap
// ============================================================================

/// Percent-complete per file name for the active batch
///
/// Read by the UI as an unordered projection. Duplicate names within a batch
/// share one entry and the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadProgressMap(HashMap<String, u8>);

impl UploadProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with every name present at [`STARTED_PERCENT`]
    pub fn with_started<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            names
                .into_iter()
                .map(|name| (name.into(), STARTED_PERCENT))
                .collect(),
        )
    }

    /// Merges a progress tick, clamping to 100
    pub fn record(&mut self, file_name: impl Into<String>, percent: u8) {
        self.0
            .insert(file_name.into(), percent.min(COMPLETE_PERCENT));
    }

    pub fn get(&self, file_name: &str) -> Option<u8> {
        self.0.get(file_name).copied()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.0.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(name, pct)| (name.as_str(), *pct))
    }

    /// Returns true if every entry has reached 100
    pub fn is_complete(&self) -> bool {
        !self.0.is_empty() && self.0.values().all(|p| *p >= COMPLETE_PERCENT)
    }
}

// ============================================================================
// UploadBatchResult
// ============================================================================

/// Terminal outcome of a batch that was not aborted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadBatchResult {
    /// Nothing was submitted
    Empty,
    /// Exactly one file was submitted and it succeeded
    Single(RemoteFile),
    /// Any other completed batch; path-mode failures are counted but the
    /// batch still reports success
    Aggregate { submitted: usize, failed: usize },
}

impl UploadBatchResult {
    /// The uploaded file when this is a single-file result
    pub fn single(&self) -> Option<&RemoteFile> {
        match self {
            UploadBatchResult::Single(file) => Some(file),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_file_name_handles_both_separators() {
        assert_eq!(UploadSource::path("/home/u/shot.png").file_name(), "shot.png");
        assert_eq!(
            UploadSource::path("C:\\Users\\u\\report.pdf").file_name(),
            "report.pdf"
        );
        assert_eq!(UploadSource::path("plain.txt").file_name(), "plain.txt");
    }

    #[test]
    fn test_path_without_segment_falls_back_to_whole_path() {
        assert_eq!(UploadSource::path("/tmp/").file_name(), "/tmp/");
    }

    #[test]
    fn test_mode_failure_policies() {
        assert_eq!(UploadMode::Bytes.failure_policy(), FailurePolicy::AbortBatch);
        assert_eq!(UploadMode::Path.failure_policy(), FailurePolicy::IsolateFile);
    }

    #[test]
    fn test_batch_rejects_mixed_modes() {
        let result = UploadBatch::new(
            UploadMode::Bytes,
            vec![UploadSource::bytes("a", vec![1]), UploadSource::path("/b")],
        );
        assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
    }

    #[test]
    fn test_batch_preserves_input_order() {
        let batch = UploadBatch::from_paths(["/x/c.txt", "/x/a.txt", "/x/b.txt"]);
        assert_eq!(batch.mode(), UploadMode::Path);
        assert_eq!(batch.file_names(), vec!["c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_progress_map_starts_every_file_at_sentinel() {
        let map = UploadProgressMap::with_started(["a.png", "b.png"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a.png"), Some(STARTED_PERCENT));
        assert_eq!(map.get("b.png"), Some(STARTED_PERCENT));
        assert!(!map.is_complete());
    }

    #[test]
    fn test_progress_map_last_write_wins_and_clamps() {
        let mut map = UploadProgressMap::with_started(["a.png"]);
        map.record("a.png", 60);
        map.record("a.png", 20);
        assert_eq!(map.get("a.png"), Some(20));

        map.record("a.png", 250);
        assert_eq!(map.get("a.png"), Some(100));
        assert!(map.is_complete());
    }

    #[test]
    fn test_duplicate_names_collide() {
        let batch = UploadBatch::from_bytes([("same.txt", vec![1]), ("same.txt", vec![2])]);
        let map = UploadProgressMap::with_started(batch.file_names());
        assert_eq!(batch.len(), 2);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_single_accessor() {
        let file = RemoteFile::new("1", "a.png", "https://link");
        assert_eq!(UploadBatchResult::Single(file.clone()).single(), Some(&file));
        assert!(UploadBatchResult::Aggregate {
            submitted: 2,
            failed: 0
        }
        .single()
        .is_none());
    }
}
