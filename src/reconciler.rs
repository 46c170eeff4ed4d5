// src/reconciler.rs

use crate::cooldown::CooldownPolicy;
use crate::downloader::{stream_to_file, DEFAULT_CHUNK_SIZE};
use crate::models::{Directive, Manifest, SyncOutcome, SyncReport, SyncStatus};
use crate::progress::{ProgressTracker, SyncObserver};
use crate::remote::RemoteSource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What a failed download does to the rest of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Report the failure, cool down, move on to the next entry.
    #[default]
    ContinueOnError,
    /// Report the failure and skip every remaining entry.
    StopOnError,
}

/// Applies manifest directives to a mods directory, one entry at a time.
pub struct Reconciler<R: ?Sized> {
    remote: Arc<R>,
    chunk_size: usize,
    cooldown: CooldownPolicy,
    error_policy: ErrorPolicy,
    cancel: Option<CancellationToken>,
}

impl<R: RemoteSource + ?Sized> Reconciler<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cooldown: CooldownPolicy::default(),
            error_policy: ErrorPolicy::default(),
            cancel: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_cooldown(mut self, cooldown: CooldownPolicy) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Token checked between entries.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Resolves every entry in manifest order. Never fails as a whole: the
    /// batch always ends with [`SyncStatus::BatchComplete`] and progress 1.0.
    pub async fn reconcile(
        &self,
        manifest: &Manifest,
        mods_dir: &Path,
        total_bytes: u64,
        observer: &mut dyn SyncObserver,
    ) -> SyncReport {
        let mut tracker = ProgressTracker::new(total_bytes);
        let mut report = SyncReport { total_bytes, ..Default::default() };
        let last = manifest.len().saturating_sub(1);

        for (index, entry) in manifest.iter().enumerate() {
            if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                info!(remaining = manifest.len() - index, "sync cancelled");
                observer.on_status(&SyncStatus::Cancelled);
                report.cancelled = true;
                break;
            }

            let name = entry.file_name();
            if !entry.has_safe_id() {
                warn!(mod_id = %entry.mod_id, "mod id would escape the mods directory, skipping");
                observer.on_status(&SyncStatus::InvalidModId(name));
                report.outcomes.push((entry.mod_id.clone(), SyncOutcome::InvalidModId));
                continue;
            }

            let target = entry.target_path(mods_dir);
            let outcome = match &entry.directive {
                Directive::Delete => self.delete(&target, &name, observer).await,
                Directive::Download { url } => {
                    self.download(url, &target, &name, &mut tracker, observer).await
                }
            };

            let failed = matches!(outcome, SyncOutcome::DownloadFailed(_));
            report.outcomes.push((entry.mod_id.clone(), outcome));

            if failed {
                match self.error_policy {
                    ErrorPolicy::ContinueOnError if index < last => self.cooldown.wait().await,
                    ErrorPolicy::ContinueOnError => {}
                    ErrorPolicy::StopOnError => {
                        warn!(mod_id = %entry.mod_id, "stopping batch after failed download");
                        break;
                    }
                }
            }
        }

        report.downloaded_bytes = tracker.downloaded_bytes();
        info!(
            downloaded = report.downloaded(),
            deleted = report.deleted(),
            failed = report.failed(),
            rejected = report.rejected(),
            bytes = report.downloaded_bytes,
            "batch complete"
        );
        observer.on_status(&SyncStatus::BatchComplete);
        tracker.finish(observer);
        report
    }

    async fn delete(
        &self,
        target: &Path,
        name: &str,
        observer: &mut dyn SyncObserver,
    ) -> SyncOutcome {
        match tokio::fs::try_exists(target).await {
            Ok(true) => {}
            Ok(false) => return Self::skip_delete(name, observer),
            // Existence unknown: attempt the removal and let it decide.
            Err(e) => warn!(file = name, error = %e, "could not check file before delete"),
        }

        // Best effort: a failed removal is still reported as deleted.
        match tokio::fs::remove_file(target).await {
            Ok(()) => info!(file = name, "deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Self::skip_delete(name, observer)
            }
            Err(e) => warn!(file = name, error = %e, "could not remove file"),
        }
        observer.on_status(&SyncStatus::Deleted(name.to_string()));
        SyncOutcome::Deleted
    }

    fn skip_delete(name: &str, observer: &mut dyn SyncObserver) -> SyncOutcome {
        info!(file = name, "nothing to delete");
        observer.on_status(&SyncStatus::DeleteSkippedNotFound(name.to_string()));
        SyncOutcome::DeleteSkippedNotFound
    }

    async fn download(
        &self,
        url: &str,
        target: &Path,
        name: &str,
        tracker: &mut ProgressTracker,
        observer: &mut dyn SyncObserver,
    ) -> SyncOutcome {
        observer.on_status(&SyncStatus::Downloading(name.to_string()));

        let result = stream_to_file(&*self.remote, url, target, self.chunk_size, |n| {
            tracker.record(n, &mut *observer)
        })
        .await;

        match result {
            Ok(bytes) => {
                info!(file = name, bytes, "downloaded");
                observer.on_status(&SyncStatus::Downloaded(name.to_string()));
                SyncOutcome::Downloaded
            }
            Err(e) => {
                warn!(file = name, url, error = %e, "download failed");
                observer.on_status(&SyncStatus::DownloadFailed(name.to_string()));
                SyncOutcome::DownloadFailed(e.to_string())
            }
        }
    }
}
