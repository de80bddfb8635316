//! Recent uploads use case
//!
//! Holds the listing shown in the recents view and applies deletes
//! optimistically. A failed delete only undoes its own removal, using the
//! listing as it was when that delete started; concurrent deletes never
//! share rollback state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{
    config::RecentsConfig,
    domain::RecentFile,
    ports::ICommandBridge,
};

use super::clipboard::LinkCopier;

#[derive(Debug, Default)]
struct Listing {
    files: Vec<RecentFile>,
    refreshing: usize,
}

/// Use case backing the recents view
pub struct RecentFilesStore {
    bridge: Arc<dyn ICommandBridge>,
    copier: LinkCopier,
    config: RecentsConfig,
    listing: Mutex<Listing>,
}

impl std::fmt::Debug for RecentFilesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentFilesStore")
            .field("listing", &*self.lock())
            .finish()
    }
}

/// Decrements the in-flight refresh count however `refresh` exits
struct RefreshGuard<'a>(&'a RecentFilesStore);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let mut listing = self.0.lock();
        listing.refreshing = listing.refreshing.saturating_sub(1);
    }
}

impl RecentFilesStore {
    pub fn new(
        bridge: Arc<dyn ICommandBridge>,
        copier: LinkCopier,
        config: RecentsConfig,
    ) -> Self {
        Self {
            bridge,
            copier,
            config,
            listing: Mutex::new(Listing::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Listing> {
        self.listing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current listing, most recent first
    pub fn files(&self) -> Vec<RecentFile> {
        self.lock().files.clone()
    }

    /// True while at least one refresh is in flight
    pub fn is_loading(&self) -> bool {
        self.lock().refreshing > 0
    }

    /// Id of the entry whose link was copied, while the label is shown
    pub fn copied_id(&self) -> Option<String> {
        self.copier.copied_id()
    }

    /// Replaces the listing with the backend's
    ///
    /// On failure the previous listing stays in place.
    pub async fn refresh(&self) -> Result<()> {
        self.lock().refreshing += 1;
        let _guard = RefreshGuard(self);

        match self
            .bridge
            .list_recent_files()
            .await
            .context("Failed to list recent uploads")
        {
            Ok(files) => {
                debug!(count = files.len(), "Recent uploads refreshed");
                self.lock().files = files;
                Ok(())
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Refresh failed");
                Err(e)
            }
        }
    }

    /// Removes an entry, then deletes it remotely
    ///
    /// # Errors
    ///
    /// Returns the bridge error after restoring the entry at its previous
    /// position. No toast is shown.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        let before = {
            let mut listing = self.lock();
            let before = listing.files.clone();
            listing.files.retain(|f| f.id != file_id);
            before
        };

        let result = self
            .bridge
            .delete_file(file_id)
            .await
            .with_context(|| format!("Failed to delete {file_id}"));

        if let Err(e) = &result {
            warn!(file = %file_id, error = %format!("{e:#}"), "Delete failed, restoring entry");
            restore(&mut self.lock().files, &before, file_id);
        }
        result
    }

    /// Copies the entry's share link and flags it as copied
    pub async fn copy_link(&self, file_id: &str) -> Result<()> {
        let link = self
            .lock()
            .files
            .iter()
            .find(|f| f.id == file_id)
            .map(|f| f.view_link.clone())
            .with_context(|| format!("No recent upload with id {file_id}"))?;
        self.copier
            .copy(&link, file_id, self.config.copied_flag())
            .await
    }
}

/// Puts `file_id` back after its nearest predecessor in `before` that is
/// still listed, or at the front
///
/// No-op if the entry is already present or was not in `before`.
fn restore(files: &mut Vec<RecentFile>, before: &[RecentFile], file_id: &str) {
    if files.iter().any(|f| f.id == file_id) {
        return;
    }
    let Some(index) = before.iter().position(|f| f.id == file_id) else {
        return;
    };
    let at = before[..index]
        .iter()
        .rev()
        .find_map(|prev| files.iter().position(|f| f.id == prev.id))
        .map_or(0, |pos| pos + 1);
    files.insert(at, before[index].clone());
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::ConfigBuilder;
    use crate::usecases::mocks::{remote, settle, MockBridge, MockShell};

    fn ids(files: &[RecentFile]) -> Vec<&str> {
        files.iter().map(|f| f.id.as_str()).collect()
    }

    fn store_with(
        bridge: MockBridge,
        names: &[&str],
    ) -> (Arc<MockBridge>, Arc<MockShell>, RecentFilesStore) {
        *bridge.listing.lock().unwrap() = names.iter().map(|n| remote(n)).collect();
        let bridge = Arc::new(bridge);
        let shell = Arc::new(MockShell::default());
        let store = RecentFilesStore::new(
            bridge.clone(),
            LinkCopier::new(shell.clone()),
            ConfigBuilder::new().build().recents,
        );
        (bridge, shell, store)
    }

    #[tokio::test]
    async fn test_refresh_replaces_listing() {
        let (bridge, _, store) = store_with(MockBridge::default(), &["a", "b"]);

        store.refresh().await.unwrap();
        assert_eq!(ids(&store.files()), vec!["id-a", "id-b"]);
        assert!(!store.is_loading());

        *bridge.listing.lock().unwrap() = vec![remote("c")];
        store.refresh().await.unwrap();
        assert_eq!(ids(&store.files()), vec!["id-c"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_listing() {
        let (_, _, store) = store_with(MockBridge::default(), &["a"]);
        store.refresh().await.unwrap();

        let failing = MockBridge {
            listing_fails: true,
            ..MockBridge::default()
        };
        let store = RecentFilesStore {
            bridge: Arc::new(failing),
            ..store
        };
        assert!(store.refresh().await.is_err());
        assert_eq!(ids(&store.files()), vec!["id-a"]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_loading_set_while_in_flight() {
        let (_, _, store) = store_with(MockBridge::default(), &["a"]);

        let refresh = store.refresh();
        tokio::pin!(refresh);
        assert!(futures_util::poll!(refresh.as_mut()).is_pending());
        assert!(store.is_loading());
        refresh.await.unwrap();
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_delete_success_removes_entry() {
        let (bridge, _, store) = store_with(MockBridge::default(), &["a", "b", "c"]);
        store.refresh().await.unwrap();

        store.delete("id-b").await.unwrap();
        assert_eq!(ids(&store.files()), vec!["id-a", "id-c"]);
        assert_eq!(bridge.count("delete_file"), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_restores_position() {
        let bridge = MockBridge::default();
        bridge.fail_delete("id-b");
        let (_, _, store) = store_with(bridge, &["a", "b", "c"]);
        store.refresh().await.unwrap();

        assert!(store.delete("id-b").await.is_err());
        assert_eq!(ids(&store.files()), vec!["id-a", "id-b", "id-c"]);
    }

    #[tokio::test]
    async fn test_concurrent_deletes_roll_back_independently() {
        let bridge = MockBridge::default();
        bridge.fail_delete("id-b");
        let (_, _, store) = store_with(bridge, &["a", "b", "c", "d"]);
        store.refresh().await.unwrap();

        let (b, d) = futures_util::join!(store.delete("id-b"), store.delete("id-d"));

        assert!(b.is_err());
        assert!(d.is_ok());
        assert_eq!(ids(&store.files()), vec!["id-a", "id-b", "id-c"]);
    }

    #[tokio::test]
    async fn test_failed_delete_restores_at_front_when_predecessor_gone() {
        let bridge = MockBridge::default();
        bridge.fail_delete("id-b");
        let (_, _, store) = store_with(bridge, &["a", "b", "c"]);
        store.refresh().await.unwrap();

        // "a" goes away while the delete of "b" is still pending
        let (b, a) = futures_util::join!(store.delete("id-b"), store.delete("id-a"));

        assert!(b.is_err());
        assert!(a.is_ok());
        assert_eq!(ids(&store.files()), vec!["id-b", "id-c"]);
    }

    #[tokio::test]
    async fn test_concurrent_failed_deletes_both_restored() {
        let bridge = MockBridge::default();
        bridge.fail_delete("id-b");
        bridge.fail_delete("id-c");
        let (_, _, store) = store_with(bridge, &["a", "b", "c", "d"]);
        store.refresh().await.unwrap();

        let (b, c) = futures_util::join!(store.delete("id-b"), store.delete("id-c"));

        // each lands after "a", the nearest survivor in its own pre-image
        assert!(b.is_err() && c.is_err());
        let files = store.files();
        assert_eq!(files.len(), 4);
        assert_eq!(files[0].id, "id-a");
        assert_eq!(files[3].id, "id-d");
        for id in ["id-b", "id-c"] {
            assert_eq!(files.iter().filter(|f| f.id == id).count(), 1);
        }
    }

    #[tokio::test]
    async fn test_rollback_does_not_duplicate_refreshed_entry() {
        let bridge = MockBridge::default();
        bridge.fail_delete("id-b");
        let (_, _, store) = store_with(bridge, &["a", "b"]);
        store.refresh().await.unwrap();

        let (refreshed, deleted) = futures_util::join!(store.refresh(), store.delete("id-b"));

        assert!(deleted.is_err());
        assert!(refreshed.is_ok());
        assert_eq!(ids(&store.files()), vec!["id-a", "id-b"]);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_still_calls_bridge() {
        let (bridge, _, store) = store_with(MockBridge::default(), &["a"]);
        store.refresh().await.unwrap();

        store.delete("id-zzz").await.unwrap();
        assert_eq!(bridge.count("delete_file"), 1);
        assert_eq!(ids(&store.files()), vec!["id-a"]);
    }

    #[test]
    fn test_restore_falls_back_to_front() {
        let before = vec![remote("a"), remote("b")];
        let mut files = Vec::new();
        restore(&mut files, &before, "id-b");
        assert_eq!(ids(&files), vec!["id-b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_link_flags_entry_for_two_seconds() {
        let (_, shell, store) = store_with(MockBridge::default(), &["a"]);
        store.refresh().await.unwrap();

        store.copy_link("id-a").await.unwrap();
        assert_eq!(shell.clipboard_writes(), vec![remote("a").view_link]);
        assert_eq!(store.copied_id().as_deref(), Some("id-a"));

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(store.copied_id(), None);
    }

    #[tokio::test]
    async fn test_copy_link_unknown_id_fails() {
        let (_, shell, store) = store_with(MockBridge::default(), &[]);
        assert!(store.copy_link("id-a").await.is_err());
        assert!(shell.clipboard_writes().is_empty());
    }
}
