use super::traits::{encode_lines, AppendSink, SinkError};
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Append sink backed by a single file handle.
///
/// Writes run on the blocking pool under a mutex, so a caller that is
/// cancelled mid-append never leaves a torn line behind: the critical section
/// finishes (or rolls back) regardless of whether anyone awaits it.
pub struct FileSink {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl FileSink {
    /// Open `path` for appending, creating it and any missing parent
    /// directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;

        info!(path = %path.display(), "Opened append sink");

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(Some(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AppendSink for FileSink {
    async fn append(&self, lines: &[String]) -> Result<usize, SinkError> {
        let buf = encode_lines(lines)?;
        if buf.is_empty() {
            return Ok(0);
        }

        let file = Arc::clone(&self.file);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_synced(&file, &path, &buf))
            .await
            .map_err(|e| SinkError::Task(e.to_string()))?
    }

    async fn close(&self) -> Result<(), SinkError> {
        let file = Arc::clone(&self.file);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match guard.take() {
                Some(handle) => {
                    handle.sync_all().map_err(|e| io_error(&path, e))?;
                    info!(path = %path.display(), "Closed append sink");
                    Ok(())
                }
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| SinkError::Task(e.to_string()))?
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Write `buf` and sync it. On failure the file is truncated back to its
/// previous length so no partial record survives.
fn write_synced(file: &Mutex<Option<File>>, path: &Path, buf: &[u8]) -> Result<usize, SinkError> {
    let mut guard = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let handle = guard
        .as_mut()
        .ok_or_else(|| SinkError::Closed(path.display().to_string()))?;

    append_or_rollback(handle, path, buf)
}

/// The file operations an append needs, split out so the rollback path can
/// be driven by a writer that fails partway through.
trait AppendTarget: Write {
    fn current_len(&self) -> std::io::Result<u64>;
    fn sync(&mut self) -> std::io::Result<()>;
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()>;
}

impl AppendTarget for File {
    fn current_len(&self) -> std::io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_data()
    }

    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

fn append_or_rollback<T: AppendTarget>(
    target: &mut T,
    path: &Path,
    buf: &[u8],
) -> Result<usize, SinkError> {
    let start = target.current_len().map_err(|e| io_error(path, e))?;

    if let Err(e) = target.write_all(buf).and_then(|()| target.sync()) {
        if let Err(rollback) = target.truncate_to(start) {
            error!(
                path = %path.display(),
                offset = start,
                error = %rollback,
                "Failed to roll back partial append"
            );
        }
        return Err(io_error(path, e));
    }

    debug!(path = %path.display(), bytes = buf.len(), "Appended and synced");
    Ok(buf.len())
}

fn io_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source,
    }
}
