// src/progress.rs

use crate::models::{SyncEvent, SyncStatus};
use tokio::sync::mpsc::UnboundedSender;

/// Receives progress fractions and status lines from a run.
pub trait SyncObserver: Send {
    /// Overall fraction in `0.0..=1.0`. Never decreases within a run.
    fn on_progress(&mut self, fraction: f32);

    fn on_status(&mut self, status: &SyncStatus);
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {
    fn on_progress(&mut self, _fraction: f32) {}

    fn on_status(&mut self, _status: &SyncStatus) {}
}

/// Forwards events to a foreground consumer. A dropped receiver is ignored.
impl SyncObserver for UnboundedSender<SyncEvent> {
    fn on_progress(&mut self, fraction: f32) {
        let _ = self.send(SyncEvent::Progress(fraction));
    }

    fn on_status(&mut self, status: &SyncStatus) {
        let _ = self.send(SyncEvent::Status(status.clone()));
    }
}

/// Byte accumulator owned by a single run.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    downloaded_bytes: u64,
    total_bytes: u64,
    last_emitted: f32,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        Self { downloaded_bytes: 0, total_bytes, last_emitted: 0.0 }
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// `None` while the total is unknown (zero).
    pub fn fraction(&self) -> Option<f32> {
        if self.total_bytes == 0 {
            return None;
        }
        let done = self.downloaded_bytes as f64 / self.total_bytes as f64;
        Some(done.min(1.0) as f32)
    }

    /// Adds `bytes` and pushes the new fraction if it moved forward.
    pub fn record(&mut self, bytes: u64, observer: &mut dyn SyncObserver) {
        self.downloaded_bytes = self.downloaded_bytes.saturating_add(bytes);
        if let Some(fraction) = self.fraction() {
            if fraction > self.last_emitted {
                self.last_emitted = fraction;
                observer.on_progress(fraction);
            }
        }
    }

    /// Batch end: progress jumps to its maximum whatever happened before.
    pub fn finish(&mut self, observer: &mut dyn SyncObserver) {
        self.last_emitted = 1.0;
        observer.on_progress(1.0);
    }
}
