//! Blocking file download with progress reporting and cooperative cancellation.

use std::error::Error;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use url::Url;

use super::checks::{create_if_directory_does_not_exist, warn_if_file_exists};
use crate::cancel::CancellationToken;
use crate::error::RuntimeError;
use crate::log_args;
use crate::logging::Logger;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const CHUNK_SIZE: usize = 64 * 1024;

/// Snapshot handed to the progress callback after every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub bytes_received: u64,
    /// `None` when the source did not announce a length.
    pub total_bytes: Option<u64>,
}

/// Downloads `http`, `https` and `file` URLs onto local paths.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    log: Logger,
    cancel: CancellationToken,
}

impl Downloader {
    pub fn new(log: Logger, cancel: CancellationToken, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self::with_client(client, log, cancel))
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, headers).
    pub fn with_client(client: Client, log: Logger, cancel: CancellationToken) -> Self {
        Self {
            client,
            log,
            cancel,
        }
    }

    /// Download with progress logged at debug level.
    pub fn download_file(&self, name: &str, url: &Url, dest: &Path) -> Result<bool> {
        let log = self.log.clone();
        self.download_file_with_progress(name, url, dest, |progress| {
            let total = progress
                .total_bytes
                .map_or_else(|| "unknown".to_string(), |total| total.to_string());
            log.debug(
                "Received {0} bytes of {1} for {2}.",
                log_args![progress.bytes_received, total, dest],
            );
        })
    }

    /// Download `url` to `dest`, overwriting it.
    ///
    /// Data lands in `{dest}.part` and is renamed into place at the end.
    /// Returns `true` only if `dest` exists afterwards. Anything that keeps
    /// the file from being produced (connection or I/O failure, non-success
    /// HTTP status, missing `file:` source) is logged as an error and yields
    /// `false`. Only cancellation (`RuntimeError::Cancelled`, checked between
    /// chunks, partial file removed) and unsupported schemes are errors.
    pub fn download_file_with_progress<F>(
        &self,
        name: &str,
        url: &Url,
        dest: &Path,
        mut on_progress: F,
    ) -> Result<bool>
    where
        F: FnMut(DownloadProgress),
    {
        let mut op = self.log.begin(
            "Downloading {0} from {1} to {2}",
            log_args![name, url.as_str(), dest],
        );
        warn_if_file_exists(&self.log, dest);
        self.cancel.check()?;

        let Some((reader, total)) = self.open(url)? else {
            return Ok(false);
        };
        let partial = partial_path(dest);
        let result = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), |parent| {
                create_if_directory_does_not_exist(parent).map(|_| ())
            })
            .and_then(|()| self.transfer(name, reader, total, &partial, &mut on_progress))
            .and_then(|()| {
                fs::rename(&partial, dest).with_context(|| {
                    format!("move {} to {}", partial.display(), dest.display())
                })
            });
        if let Err(err) = result {
            let _ = fs::remove_file(&partial);
            if matches!(err.downcast_ref::<RuntimeError>(), Some(RuntimeError::Cancelled)) {
                return Err(err);
            }
            let cause: &(dyn Error + 'static) = err.as_ref();
            self.log.error_with(
                cause,
                "Download of {0} from {1} failed.",
                log_args![name, url.as_str()],
            );
            return Ok(false);
        }

        if dest.is_file() {
            op.complete();
            Ok(true)
        } else {
            self.log
                .error("Did not locate file at {0}.", log_args![dest]);
            Ok(false)
        }
    }

    /// `None` when the source cannot be reached; the reason is already logged.
    fn open(&self, url: &Url) -> Result<Option<(Box<dyn Read>, Option<u64>)>> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| anyhow!("invalid file url {url}"))?;
                if !path.is_file() {
                    self.log
                        .error("Source file {0} does not exist.", log_args![&path]);
                    return Ok(None);
                }
                let file = match File::open(&path) {
                    Ok(file) => file,
                    Err(err) => {
                        self.log
                            .error_with(&err, "Could not open {0}.", log_args![&path]);
                        return Ok(None);
                    }
                };
                let total = file.metadata().ok().map(|meta| meta.len());
                Ok(Some((Box::new(file), total)))
            }
            "http" | "https" => {
                let response = match self.client.get(url.clone()).send() {
                    Ok(response) => response,
                    Err(err) => {
                        self.log.error_with(
                            &err,
                            "Request to {0} failed.",
                            log_args![url.as_str()],
                        );
                        return Ok(None);
                    }
                };
                let status = response.status();
                if !status.is_success() {
                    self.log.error(
                        "Download from {0} failed with status {1}.",
                        log_args![url.as_str(), status.as_u16()],
                    );
                    return Ok(None);
                }
                let total = response.content_length();
                Ok(Some((Box::new(response), total)))
            }
            other => bail!("unsupported url scheme {other}"),
        }
    }

    fn transfer(
        &self,
        name: &str,
        mut reader: Box<dyn Read>,
        total: Option<u64>,
        partial: &Path,
        on_progress: &mut dyn FnMut(DownloadProgress),
    ) -> Result<()> {
        let file =
            File::create(partial).with_context(|| format!("create {}", partial.display()))?;
        let mut writer = BufWriter::new(file);
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut received = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                self.log.warn(
                    "Download of {0} cancelled after {1} bytes.",
                    log_args![name, received],
                );
                return Err(RuntimeError::Cancelled.into());
            }
            let n = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err).context("read download stream"),
            };
            writer
                .write_all(&chunk[..n])
                .with_context(|| format!("write {}", partial.display()))?;
            received += n as u64;
            on_progress(DownloadProgress {
                bytes_received: received,
                total_bytes: total,
            });
        }

        writer
            .flush()
            .with_context(|| format!("flush {}", partial.display()))?;
        Ok(())
    }
}

/// One-shot download with the default timeout.
pub fn download_file(
    log: &Logger,
    cancel: &CancellationToken,
    name: &str,
    url: &Url,
    dest: &Path,
) -> Result<bool> {
    Downloader::new(log.clone(), cancel.clone(), DEFAULT_TIMEOUT)?.download_file(name, url, dest)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map_or_else(|| OsString::from("download"), OsString::from);
    name.push(".part");
    dest.with_file_name(name)
}
