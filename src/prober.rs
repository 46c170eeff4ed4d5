// src/prober.rs

use crate::models::Manifest;
use crate::remote::RemoteSource;
use tracing::{debug, warn};

/// Sums the declared sizes of every download in `manifest`.
///
/// Best effort: a size check that fails contributes 0. The result only normalizes
/// the progress fraction.
pub async fn total_size<R>(remote: &R, manifest: &Manifest) -> u64
where
    R: RemoteSource + ?Sized,
{
    let mut total: u64 = 0;
    for url in manifest.download_urls() {
        match remote.content_length(url).await {
            Ok(len) => {
                debug!(url, len, "sized");
                total = total.saturating_add(len);
            }
            Err(e) => warn!(url, error = %e, "size check failed, counting as 0"),
        }
    }
    total
}
