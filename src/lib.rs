pub mod config;
pub mod cooldown;
pub mod downloader;
pub mod logging;
pub mod manager;
pub mod manifest;
pub mod models;
pub mod prober;
pub mod progress;
pub mod reconciler;
pub mod remote;

/// Convenient type alias exposing common structs.
pub mod prelude {
    pub use crate::config::SyncConfig;
    pub use crate::cooldown::CooldownPolicy;
    pub use crate::manager::{SyncError, SyncManager};
    pub use crate::models::{Directive, Manifest, ManifestEntry, SyncEvent, SyncOutcome, SyncReport, SyncStatus};
    pub use crate::progress::{NoopObserver, SyncObserver};
    pub use crate::reconciler::{ErrorPolicy, Reconciler};
    pub use crate::remote::{HttpRemote, RemoteSource};
}
