//! Copy-link helper with a self-clearing "copied" indicator
//!
//! Used by the upload view (single-file success) and the recents view. Each
//! copy bumps a generation counter; the clear timer only resets the flag if
//! no newer copy happened in between.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use tracing::debug;

use crate::ports::IDesktopShell;

#[derive(Debug, Default)]
struct CopiedFlag {
    generation: u64,
    file_id: Option<String>,
}

/// Writes share links to the clipboard and tracks which one was copied last
#[derive(Clone)]
pub struct LinkCopier {
    shell: Arc<dyn IDesktopShell>,
    flag: Arc<Mutex<CopiedFlag>>,
}

impl std::fmt::Debug for LinkCopier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkCopier")
            .field("copied_id", &self.copied_id())
            .finish()
    }
}

impl LinkCopier {
    pub fn new(shell: Arc<dyn IDesktopShell>) -> Self {
        Self {
            shell,
            flag: Arc::new(Mutex::new(CopiedFlag::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CopiedFlag> {
        self.flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies `link` and marks `file_id` as copied for `display_for`
    ///
    /// The flag is only set once the clipboard write succeeded.
    pub async fn copy(
        &self,
        link: &str,
        file_id: &str,
        display_for: Duration,
    ) -> anyhow::Result<()> {
        self.shell
            .write_clipboard(link)
            .await
            .context("Failed to write link to clipboard")?;

        let generation = {
            let mut flag = self.lock();
            flag.generation += 1;
            flag.file_id = Some(file_id.to_string());
            flag.generation
        };
        debug!(file = %file_id, generation, "Link copied");

        let deadline = tokio::time::Instant::now() + display_for;
        let flag = Arc::clone(&self.flag);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut flag = flag.lock().unwrap_or_else(PoisonError::into_inner);
            if flag.generation == generation {
                flag.file_id = None;
            }
        });
        Ok(())
    }

    /// Id of the file whose link was copied most recently, while displayed
    pub fn copied_id(&self) -> Option<String> {
        self.lock().file_id.clone()
    }
}
