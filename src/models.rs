// src/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extension appended to every mod identifier on disk.
pub const MOD_EXTENSION: &str = "jar";

/// The manifest value that marks an entry for removal.
pub const DELETE_SENTINEL: &str = "delete";

/// The action a manifest entry asks for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Directive {
    /// Fetch the resource and (over)write the local file.
    Download { url: String },
    /// Remove the local file if it is present.
    Delete,
}

impl Directive {
    /// Resolves a raw manifest value into a directive.
    pub fn from_value(value: &str) -> Self {
        if value == DELETE_SENTINEL {
            Directive::Delete
        } else {
            Directive::Download { url: value.to_string() }
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Directive::Download { url } => Some(url),
            Directive::Delete => None,
        }
    }
}

/// One `modId -> directive` pair of the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub mod_id: String,
    pub directive: Directive,
}

impl ManifestEntry {
    pub fn new(mod_id: impl Into<String>, directive: Directive) -> Self {
        Self { mod_id: mod_id.into(), directive }
    }

    /// File name of the local artifact, e.g. `fabric-api.jar`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.mod_id, MOD_EXTENSION)
    }

    /// Identifiers become file names; one that would resolve outside the
    /// mods directory is never acted on.
    pub fn has_safe_id(&self) -> bool {
        let id = self.mod_id.as_str();
        !(id.is_empty()
            || id == "."
            || id == ".."
            || id.contains('/')
            || id.contains('\\')
            || id.contains('\0'))
    }

    /// Returns `<mods_dir>/<mod_id>.jar`.
    pub fn target_path(&self, mods_dir: &Path) -> PathBuf {
        mods_dir.join(self.file_name())
    }
}

/// Ordered description of the desired mod set, in remote declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// URLs of every download that will be attempted, in manifest order.
    pub fn download_urls(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.has_safe_id())
            .filter_map(|e| e.directive.url())
    }

    pub fn download_count(&self) -> usize {
        self.download_urls().count()
    }

    pub fn delete_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.directive == Directive::Delete)
            .count()
    }
}

/// What happened to a single manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncOutcome {
    Downloaded,
    Deleted,
    DeleteSkippedNotFound,
    DownloadFailed(String), // Storing a reason for failure
    InvalidModId,
}

/// Human-readable milestones pushed to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    ModsDirMissing(PathBuf),
    ManifestUnavailable(String),
    ManifestMalformed(String),
    Downloading(String),
    Downloaded(String),
    Deleted(String),
    DeleteSkippedNotFound(String),
    DownloadFailed(String),
    InvalidModId(String),
    Cancelled,
    BatchComplete,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::ModsDirMissing(path) => {
                write!(f, "mods directory not found: {}", path.display())
            }
            SyncStatus::ManifestUnavailable(reason) => {
                write!(f, "could not fetch the mod configuration: {reason}")
            }
            SyncStatus::ManifestMalformed(reason) => {
                write!(f, "mod configuration is malformed: {reason}")
            }
            SyncStatus::Downloading(name) => write!(f, "downloading: {name}"),
            SyncStatus::Downloaded(name) => write!(f, "downloaded: {name}"),
            SyncStatus::Deleted(name) => write!(f, "deleted: {name}"),
            SyncStatus::DeleteSkippedNotFound(name) => {
                write!(f, "file to delete does not exist: {name}")
            }
            SyncStatus::DownloadFailed(name) => write!(f, "error downloading: {name}"),
            SyncStatus::InvalidModId(name) => write!(f, "skipped unsafe file name: {name}"),
            SyncStatus::Cancelled => write!(f, "mod update cancelled"),
            SyncStatus::BatchComplete => write!(f, "batch complete"),
        }
    }
}

/// A single notification on the run's outbound channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Progress(f32),
    Status(SyncStatus),
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Per-entry outcomes in processing order.
    pub outcomes: Vec<(String, SyncOutcome)>,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub cancelled: bool,
}

impl SyncReport {
    pub fn outcome(&self, mod_id: &str) -> Option<&SyncOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == mod_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Downloaded))
    }

    pub fn deleted(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Deleted))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::DownloadFailed(_)))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::InvalidModId))
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_sentinel_is_exact_match() {
        assert_eq!(Directive::from_value("delete"), Directive::Delete);
        assert_eq!(
            Directive::from_value("Delete"),
            Directive::Download { url: "Delete".into() }
        );
    }

    #[test]
    fn target_path_appends_jar() {
        let entry = ManifestEntry::new("fabric-api", Directive::Delete);
        assert_eq!(
            entry.target_path(Path::new("/mods")),
            PathBuf::from("/mods/fabric-api.jar")
        );
    }

    #[test]
    fn safe_ids() {
        for id in ["fabric-api", "sodium-0.5.8", "..hidden"] {
            assert!(ManifestEntry::new(id, Directive::Delete).has_safe_id(), "{id:?}");
        }
        for id in ["", ".", "..", "../evil", "sub/dir", "a\\b", "nul\0"] {
            assert!(!ManifestEntry::new(id, Directive::Delete).has_safe_id(), "{id:?}");
        }
    }

    #[test]
    fn download_urls_skip_unsafe_ids() {
        let manifest = Manifest::new(vec![
            ManifestEntry::new("a", Directive::from_value("http://x/a.jar")),
            ManifestEntry::new("../b", Directive::from_value("http://x/b.jar")),
        ]);
        assert_eq!(manifest.download_urls().collect::<Vec<_>>(), vec!["http://x/a.jar"]);
    }

    #[test]
    fn manifest_counts_directives() {
        let manifest = Manifest::new(vec![
            ManifestEntry::new("a", Directive::from_value("http://x/a.jar")),
            ManifestEntry::new("b", Directive::Delete),
            ManifestEntry::new("c", Directive::from_value("http://x/c.jar")),
        ]);
        assert_eq!(manifest.download_count(), 2);
        assert_eq!(manifest.delete_count(), 1);
        assert_eq!(
            manifest.download_urls().collect::<Vec<_>>(),
            vec!["http://x/a.jar", "http://x/c.jar"]
        );
    }

    #[test]
    fn report_counters() {
        let report = SyncReport {
            outcomes: vec![
                ("a".into(), SyncOutcome::Downloaded),
                ("b".into(), SyncOutcome::Deleted),
                ("c".into(), SyncOutcome::DownloadFailed("boom".into())),
                ("d".into(), SyncOutcome::DeleteSkippedNotFound),
            ],
            ..Default::default()
        };
        assert_eq!(report.downloaded(), 1);
        assert_eq!(report.deleted(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcome("d"), Some(&SyncOutcome::DeleteSkippedNotFound));
    }
}
