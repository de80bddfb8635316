//! Upload batch use case
//!
//! Takes a batch of dropped or picked files, resolves the managed folder,
//! submits the files one at a time through the command bridge and keeps the
//! upload view state (progress map, feedback message, copied-link flag) in
//! sync with the backend's progress ticks.
//!
//! ## Failure handling
//!
//! Failure isolation depends on the [`UploadMode`]: a bytes batch aborts on
//! its first failed transfer, a path batch reports the failing file and
//! moves on. Either way the view is cleaned up on a timer tied to the batch
//! that scheduled it, so an older batch never erases a newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    config::UploadConfig,
    domain::{
        AuthState, BatchId, FailurePolicy, FolderHandle, RemoteFile, UploadBatch,
        UploadBatchResult, UploadProgressMap, UploadSource,
    },
    events::{BusEvent, EventBus, Topic},
    ports::{ICommandBridge, INotificationService, Notification},
};

use super::clipboard::LinkCopier;

const MSG_SINGLE_UPLOADED: &str = "File uploaded, link copied";
const MSG_BATCH_UPLOADED: &str = "Files uploaded";
const MSG_FOLDER_FAILED: &str = "Could not access the CloudTray folder";

/// Why a batch did not complete
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// Uploads are only accepted with a live session
    #[error("not authenticated")]
    NotAuthenticated,

    /// The managed folder could not be resolved or created
    #[error("managed folder unavailable: {reason}")]
    FolderUnavailable { reason: String },

    /// A bytes-mode transfer failed and the rest of the batch was dropped
    #[error("upload of '{file}' failed: {reason}")]
    TransferFailed { file: String, reason: String },
}

/// Schedules the batch's view cleanup however `submit_batch` exits,
/// including when its future is dropped mid-transfer
struct ScheduleCleanup {
    inner: Arc<Inner>,
    batch_id: BatchId,
}

impl Drop for ScheduleCleanup {
    fn drop(&mut self) {
        self.inner.schedule_cleanup(self.batch_id);
    }
}

/// Observable state of the upload view
#[derive(Debug, Default)]
struct UploadView {
    batch: Option<BatchId>,
    progress: UploadProgressMap,
    feedback: Option<Notification>,
}

struct Inner {
    bridge: Arc<dyn ICommandBridge>,
    notifier: Arc<dyn INotificationService>,
    bus: Arc<EventBus>,
    auth: watch::Receiver<AuthState>,
    copier: LinkCopier,
    config: UploadConfig,
    view: Mutex<UploadView>,
}

/// Use case for submitting upload batches
///
/// Cheap to clone; clones share the same view state.
#[derive(Clone)]
pub struct UploadOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("view", &*self.inner.lock())
            .finish()
    }
}

impl UploadOrchestrator {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `bridge` - Backend that performs the transfers
    /// * `notifier` - Toast surface for success and error messages
    /// * `bus` - Event bus carrying `upload-progress` ticks
    /// * `auth` - Session state; uploads are refused unless authenticated
    /// * `copier` - Clipboard helper for the single-file share link
    /// * `config` - Feedback and copied-flag timings
    pub fn new(
        bridge: Arc<dyn ICommandBridge>,
        notifier: Arc<dyn INotificationService>,
        bus: Arc<EventBus>,
        auth: watch::Receiver<AuthState>,
        copier: LinkCopier,
        config: UploadConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                bridge,
                notifier,
                bus,
                auth,
                copier,
                config,
                view: Mutex::new(UploadView::default()),
            }),
        }
    }

    /// Snapshot of the per-file progress of the current batch
    pub fn progress(&self) -> UploadProgressMap {
        self.inner.lock().progress.clone()
    }

    /// The feedback message currently shown under the drop area
    pub fn feedback(&self) -> Option<Notification> {
        self.inner.lock().feedback.clone()
    }

    /// Id of the file whose link was just copied, while the flag is shown
    pub fn copied_id(&self) -> Option<String> {
        self.inner.copier.copied_id()
    }

    /// The batch that currently owns the view
    pub fn current_batch(&self) -> Option<BatchId> {
        self.inner.lock().batch
    }

    /// Uploads every file of `batch` into the managed folder
    ///
    /// This method:
    /// 1. Refuses the batch unless the session is authenticated
    /// 2. Resolves the managed folder
    /// 3. Marks every file as started, then listens for progress ticks
    /// 4. Submits the files sequentially in input order
    /// 5. Reports the outcome and schedules the view cleanup
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session is not authenticated (nothing else happens)
    /// - The managed folder is unavailable
    /// - A bytes-mode transfer fails
    ///
    /// Path-mode transfer failures are reported per file and counted in the
    /// aggregate result instead.
    pub async fn submit_batch(
        &self,
        batch: UploadBatch,
    ) -> Result<UploadBatchResult, UploadError> {
        if !self.inner.auth.borrow().is_authenticated() {
            return Err(UploadError::NotAuthenticated);
        }
        if batch.is_empty() {
            return Ok(UploadBatchResult::Empty);
        }

        let inner = &self.inner;
        let batch_id = BatchId::new();
        let mode = batch.mode();
        info!(batch = %batch_id, %mode, files = batch.len(), "Upload batch started");
        {
            let mut view = inner.lock();
            view.batch = Some(batch_id);
            view.progress.clear();
            view.feedback = None;
        }
        let _cleanup = ScheduleCleanup {
            inner: Arc::clone(inner),
            batch_id,
        };

        let folder = match inner
            .bridge
            .get_or_create_app_folder()
            .await
            .context("Failed to resolve managed folder")
        {
            Ok(folder) => folder,
            Err(e) => {
                let reason = format!("{e:#}");
                error!(batch = %batch_id, error = %reason, "Upload batch aborted");
                inner.fail(batch_id, MSG_FOLDER_FAILED).await;
                return Err(UploadError::FolderUnavailable { reason });
            }
        };

        inner.with_current(batch_id, |view| {
            view.progress = UploadProgressMap::with_started(batch.file_names());
        });

        let weak = Arc::downgrade(inner);
        let subscription = inner.bus.listen(Topic::UploadProgress, move |event| {
            if let (Some(inner), BusEvent::UploadProgress { file_name, percent }) =
                (weak.upgrade(), event)
            {
                inner.record_progress(batch_id, file_name, *percent);
            }
        });

        let outcome = inner.transfer_all(batch_id, &batch, &folder).await;
        subscription.unlisten();

        let mut uploaded = match outcome {
            Ok(uploaded) => uploaded,
            Err(err) => {
                error!(batch = %batch_id, error = %err, "Upload batch aborted");
                let message = match &err {
                    UploadError::TransferFailed { file, .. } => format!("Failed to upload {file}"),
                    other => other.to_string(),
                };
                inner.fail(batch_id, &message).await;
                return Err(err);
            }
        };

        let submitted = batch.len();
        let failed = submitted - uploaded.len();
        let result = match uploaded.pop() {
            Some(file) if submitted == 1 => {
                inner
                    .show(batch_id, Notification::success(MSG_SINGLE_UPLOADED))
                    .await;
                if let Err(e) = inner
                    .copier
                    .copy(&file.view_link, &file.id, inner.config.copied_flag())
                    .await
                {
                    warn!(file = %file.name, error = %format!("{e:#}"), "Could not copy link");
                }
                UploadBatchResult::Single(file)
            }
            _ => {
                inner
                    .show(batch_id, Notification::success(MSG_BATCH_UPLOADED))
                    .await;
                UploadBatchResult::Aggregate { submitted, failed }
            }
        };

        info!(batch = %batch_id, submitted, failed, "Upload batch finished");
        Ok(result)
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, UploadView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` only while `batch_id` still owns the view
    fn with_current(&self, batch_id: BatchId, f: impl FnOnce(&mut UploadView)) {
        let mut view = self.lock();
        if view.batch == Some(batch_id) {
            f(&mut view);
        }
    }

    fn record_progress(&self, batch_id: BatchId, file_name: &str, percent: u8) {
        self.with_current(batch_id, |view| {
            if view.progress.contains(file_name) {
                view.progress.record(file_name, percent);
                debug!(batch = %batch_id, file = %file_name, percent, "Upload progress");
            }
        });
    }

    /// Transfers every file in order; at most one is in flight
    ///
    /// Returns the uploaded files, or the first bytes-mode failure.
    async fn transfer_all(
        &self,
        batch_id: BatchId,
        batch: &UploadBatch,
        folder: &FolderHandle,
    ) -> Result<Vec<RemoteFile>, UploadError> {
        let policy = batch.mode().failure_policy();
        let mut uploaded = Vec::with_capacity(batch.len());

        for source in batch.files() {
            let name = source.file_name();
            let result = match source {
                UploadSource::Bytes { name, content } => {
                    self.bridge.upload_file(content, name, &folder.id).await
                }
                UploadSource::Path(path) => self.bridge.upload_file_path(path, &folder.id).await,
            };

            match result {
                Ok(file) => {
                    debug!(batch = %batch_id, file = %name, id = %file.id, "File uploaded");
                    uploaded.push(file);
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    match policy {
                        FailurePolicy::AbortBatch => {
                            return Err(UploadError::TransferFailed { file: name, reason });
                        }
                        FailurePolicy::IsolateFile => {
                            warn!(
                                batch = %batch_id,
                                file = %name,
                                error = %reason,
                                "Upload failed"
                            );
                            self.notify(&Notification::error(format!("Failed to upload {name}")))
                                .await;
                        }
                    }
                }
            }
        }
        Ok(uploaded)
    }

    /// Clears progress and shows an error for an aborted batch
    async fn fail(&self, batch_id: BatchId, message: &str) {
        let notification = Notification::error(message);
        self.with_current(batch_id, |view| {
            view.progress.clear();
            view.feedback = Some(notification.clone());
        });
        self.notify(&notification).await;
    }

    async fn show(&self, batch_id: BatchId, notification: Notification) {
        self.with_current(batch_id, |view| view.feedback = Some(notification.clone()));
        self.notify(&notification).await;
    }

    async fn notify(&self, notification: &Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(error = %format!("{e:#}"), "Failed to show notification");
        }
    }

    /// Clears the view after the feedback timeout unless a newer batch took it
    ///
    /// Outside a runtime (a batch dropped during shutdown) the view is
    /// cleared immediately.
    fn schedule_cleanup(self: &Arc<Self>, batch_id: BatchId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.with_current(batch_id, |view| *view = UploadView::default());
            return;
        };
        let deadline = tokio::time::Instant::now() + self.config.feedback_timeout();
        let inner = Arc::clone(self);
        runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            inner.with_current(batch_id, |view| {
                *view = UploadView::default();
            });
            debug!(batch = %batch_id, "Upload view cleared");
        });
    }
}
