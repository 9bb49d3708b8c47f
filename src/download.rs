//! Idempotent download of a remote resource to a local file.
//!
//! The existence check and the write are two separate steps with no lock in
//! between: concurrent downloads to the *same* path are unsupported (both may
//! fetch, the last rename wins). Distinct paths are always safe.
//!
//! The body is streamed into a sibling staging file and renamed over the
//! target only after a complete flush, so a failed download never leaves a
//! truncated file at the target path and never clobbers an existing one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::TryStreamExt;
use reqwest::Method;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};

use crate::error::TransferError;
use crate::request::RequestSpec;
use crate::transport::ClientConfig;

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What a successful [`download`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The target already existed and `force` was not set; nothing was fetched.
    Skipped,
    /// The resource was fetched and written.
    Fetched {
        /// Bytes written to the target.
        bytes: u64,
    },
}

/// Downloads `remote_url` to `local_path`.
///
/// Skips without any network I/O when the file exists and `force` is false.
///
/// # Errors
///
/// - [`TransferError::EmptyUrl`] if `remote_url` is empty (checked first)
/// - [`TransferError::InvalidUrl`] if `remote_url` is malformed
/// - [`TransferError::Transport`] on network failure, mid-body included
/// - [`TransferError::HttpStatus`] on a non-success status
/// - [`TransferError::LocalWrite`] if the file cannot be written
#[instrument(skip(config, local_path), fields(path = %local_path.display()))]
pub async fn download(
    config: &ClientConfig,
    local_path: &Path,
    remote_url: &str,
    force: bool,
) -> Result<DownloadOutcome, TransferError> {
    if remote_url.is_empty() {
        return Err(TransferError::EmptyUrl);
    }

    if !force
        && tokio::fs::try_exists(local_path)
            .await
            .map_err(|e| TransferError::local_write(local_path, e))?
    {
        debug!("target exists, skipping download");
        return Ok(DownloadOutcome::Skipped);
    }

    let spec = RequestSpec::new(Method::GET, remote_url)?;
    let response = config.following().send(&spec).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::http_status(remote_url, status.as_u16()));
    }

    let staging = staging_path(local_path)?;
    if let Some(parent) = staging.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransferError::local_write(parent, e))?;
    }

    let written = write_staged(response, remote_url, &staging, local_path).await;
    if written.is_err() {
        debug!(staging = %staging.display(), "removing staging file after error");
        let _ = tokio::fs::remove_file(&staging).await;
    }
    let bytes = written?;

    info!(bytes, "download complete");
    Ok(DownloadOutcome::Fetched { bytes })
}

/// Streams the body into a fresh staging file, then renames it over
/// `target`. Returns the byte count.
async fn write_staged(
    response: reqwest::Response,
    url: &str,
    staging: &Path,
    target: &Path,
) -> Result<u64, TransferError> {
    let staging_err = |e| TransferError::local_write(staging, e);

    let mut writer = BufWriter::new(File::create(staging).await.map_err(staging_err)?);
    let mut body = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = body
        .try_next()
        .await
        .map_err(|e| TransferError::transport(url, e))?
    {
        writer.write_all(&chunk).await.map_err(staging_err)?;
        written += chunk.len() as u64;
    }
    writer.shutdown().await.map_err(staging_err)?;
    drop(writer);

    tokio::fs::rename(staging, target)
        .await
        .map_err(|e| TransferError::local_write(target, e))?;
    Ok(written)
}

/// Hidden sibling of `target`, unique per process and call.
fn staging_path(target: &Path) -> Result<PathBuf, TransferError> {
    let Some(name) = target.file_name() else {
        return Err(TransferError::local_write(
            target,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "download target has no file name",
            ),
        ));
    };
    let seq = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    let staged = format!(
        ".{}.{}-{seq}.part",
        name.to_string_lossy(),
        std::process::id()
    );
    Ok(target.with_file_name(staged))
}
