// src/downloader.rs

use crate::remote::{RemoteError, RemoteSource};
use std::path::Path;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Small on purpose: progress is reported once per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Custom errors for download operations.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Copies the resource at `url` into `dest`, overwriting it.
///
/// The body is read in `chunk_size` pieces and reporting is interleaved with
/// disk I/O one chunk at a time. Each piece is reported to `on_chunk` right
/// after its `write_all` succeeds, not before, so a failed write is never
/// counted and the bytes reported never exceed the bytes on disk.
/// The remote is opened before `dest` is touched. A transfer that breaks
/// midway leaves the partial file behind; the next run overwrites it.
pub async fn stream_to_file<R, F>(
    remote: &R,
    url: &str,
    dest: &Path,
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<u64, DownloadError>
where
    R: RemoteSource + ?Sized,
    F: FnMut(u64),
{
    let stream = remote.open(url).await?;
    let mut reader = StreamReader::new(stream);

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(dest)
        .await?;

    let copied = copy_chunks(&mut reader, &mut file, chunk_size, &mut on_chunk).await;
    // Flush even on failure so the partial file reflects what was written.
    let flushed = file.flush().await;
    let written = copied?;
    flushed?;

    debug!(url, dest = %dest.display(), written, "download finished");
    Ok(written)
}

async fn copy_chunks<S, W, F>(
    reader: &mut S,
    writer: &mut W,
    chunk_size: usize,
    on_chunk: &mut F,
) -> std::io::Result<u64>
where
    S: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
    F: FnMut(u64),
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut written: u64 = 0;
    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            return Ok(written);
        }
        writer.write_all(&buffer[..n]).await?;
        written += n as u64;
        on_chunk(n as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tests::{MockRemote, MockResource};

    #[tokio::test]
    async fn writes_body_in_fixed_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        let body: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let remote = MockRemote::new().with("http://x/a.jar", MockResource::body(body.clone()));

        let mut chunks = Vec::new();
        let written = stream_to_file(&remote, "http://x/a.jar", &dest, 1024, |n| chunks.push(n))
            .await
            .unwrap();

        assert_eq!(written, 2500);
        assert_eq!(chunks, vec![1024, 1024, 452]);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), body);
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        tokio::fs::write(&dest, vec![9u8; 4096]).await.unwrap();
        let remote = MockRemote::new().with("http://x/a.jar", MockResource::body("new"));

        stream_to_file(&remote, "http://x/a.jar", &dest, DEFAULT_CHUNK_SIZE, |_| {})
            .await
            .unwrap();

        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn failed_open_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        tokio::fs::write(&dest, b"old").await.unwrap();
        let remote = MockRemote::new();

        let result = stream_to_file(&remote, "http://x/a.jar", &dest, DEFAULT_CHUNK_SIZE, |_| {}).await;

        assert!(matches!(result, Err(DownloadError::Remote(_))));
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"old");
    }

    #[tokio::test]
    async fn broken_stream_keeps_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        let remote = MockRemote::new().with(
            "http://x/a.jar",
            MockResource { fail_after: Some(1500), ..MockResource::body(vec![7u8; 3000]) },
        );

        let mut reported = 0u64;
        let result =
            stream_to_file(&remote, "http://x/a.jar", &dest, 1024, |n| reported += n).await;

        assert!(matches!(result, Err(DownloadError::Io(_))));
        let on_disk = tokio::fs::metadata(&dest).await.unwrap().len();
        assert_eq!(on_disk, 1500);
        assert!(reported <= on_disk);
    }

    #[tokio::test]
    async fn missing_parent_dir_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nope").join("a.jar");
        let remote = MockRemote::new().with("http://x/a.jar", MockResource::body("x"));

        let result = stream_to_file(&remote, "http://x/a.jar", &dest, DEFAULT_CHUNK_SIZE, |_| {}).await;
        assert!(matches!(result, Err(DownloadError::Io(_))));
    }
}
