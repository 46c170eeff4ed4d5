// src/manager.rs

use crate::config::{ConfigError, SyncConfig};
use crate::manifest::{fetch_manifest, parse_manifest, FetchError, ParseError};
use crate::models::{SyncEvent, SyncReport, SyncStatus};
use crate::prober::total_size;
use crate::progress::SyncObserver;
use crate::reconciler::Reconciler;
use crate::remote::{HttpRemote, RemoteError, RemoteSource};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("mods directory not found: {0}")]
    ModsDirMissing(PathBuf),
    #[error("a synchronization run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("http client error: {0}")]
    Remote(#[from] RemoteError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("sync task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Drives complete runs: fetch, parse, size, reconcile.
///
/// Only one run may be active per manager; overlapping requests get
/// [`SyncError::RunInProgress`].
pub struct SyncManager<R: ?Sized> {
    remote: Arc<R>,
    config: SyncConfig,
    running: Arc<AtomicBool>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl SyncManager<HttpRemote> {
    /// Builds a manager talking HTTP with the configured client settings.
    pub fn from_config(config: SyncConfig) -> Result<Self, SyncError> {
        let remote = HttpRemote::new(&config.user_agent, config.request_timeout())?;
        Self::new(Arc::new(remote), config)
    }
}

impl<R: RemoteSource + ?Sized> SyncManager<R> {
    pub fn new(remote: Arc<R>, config: SyncConfig) -> Result<Self, SyncError> {
        config.validate()?;
        Ok(Self {
            remote,
            config,
            running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Token for the active run, or the next one if none is active.
    pub fn cancellation_token(&self) -> CancellationToken {
        lock_token(&self.cancel).clone()
    }

    /// Stops the active run before its next entry.
    pub fn cancel(&self) {
        lock_token(&self.cancel).cancel();
    }

    /// Performs one run on the current task.
    pub async fn run(&self, observer: &mut dyn SyncObserver) -> Result<SyncReport, SyncError> {
        let _guard = RunGuard::acquire(&self.running, &self.cancel)?;

        let mods_dir = self.config.mods_dir.clone();
        let dir_ok = tokio::fs::metadata(&mods_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !dir_ok {
            error!(mods_dir = %mods_dir.display(), "mods directory not found");
            observer.on_status(&SyncStatus::ModsDirMissing(mods_dir.clone()));
            return Err(SyncError::ModsDirMissing(mods_dir));
        }

        let token = self.cancellation_token();
        observer.on_progress(0.0);
        info!(manifest = %self.config.manifest_url, mods_dir = %mods_dir.display(), "sync started");

        let raw = match fetch_manifest(&*self.remote, &self.config.manifest_url).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "could not fetch manifest");
                observer.on_status(&SyncStatus::ManifestUnavailable(e.to_string()));
                return Err(e.into());
            }
        };

        let manifest = match parse_manifest(&raw) {
            Ok(manifest) => manifest,
            Err(e) => {
                error!(error = %e, "could not parse manifest");
                observer.on_status(&SyncStatus::ManifestMalformed(e.to_string()));
                return Err(e.into());
            }
        };

        let total = total_size(&*self.remote, &manifest).await;
        info!(entries = manifest.len(), total_bytes = total, "manifest resolved");

        let reconciler = Reconciler::new(self.remote.clone())
            .with_chunk_size(self.config.chunk_size)
            .with_cooldown(self.config.cooldown())
            .with_error_policy(self.config.error_policy())
            .with_cancellation(token);

        Ok(reconciler.reconcile(&manifest, &mods_dir, total, observer).await)
    }
}

impl<R: RemoteSource + ?Sized + 'static> SyncManager<R> {
    /// Runs in the background so the caller is never blocked.
    pub fn spawn<O>(self: &Arc<Self>, mut observer: O) -> JoinHandle<Result<SyncReport, SyncError>>
    where
        O: SyncObserver + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { this.run(&mut observer).await })
    }

    /// Like [`spawn`](Self::spawn), delivering events over a channel.
    pub fn spawn_with_channel(
        self: &Arc<Self>,
    ) -> (JoinHandle<Result<SyncReport, SyncError>>, UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.spawn(tx), rx)
    }
}

fn lock_token(cancel: &Mutex<CancellationToken>) -> std::sync::MutexGuard<'_, CancellationToken> {
    cancel.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Marks a run active; on drop frees the slot and arms a fresh token.
struct RunGuard {
    running: Arc<AtomicBool>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl RunGuard {
    fn acquire(
        running: &Arc<AtomicBool>,
        cancel: &Arc<Mutex<CancellationToken>>,
    ) -> Result<Self, SyncError> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SyncError::RunInProgress)?;
        Ok(Self { running: running.clone(), cancel: cancel.clone() })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut token = lock_token(&self.cancel);
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
        self.running.store(false, Ordering::SeqCst);
    }
}
