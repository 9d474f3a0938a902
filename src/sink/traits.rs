use async_trait::async_trait;

/// Line-oriented, append-only storage.
///
/// Each `append` call is atomic with respect to other callers: its lines land
/// contiguously, and on failure none of them remain. A successful return
/// means the bytes have been synced to stable storage.
#[async_trait]
pub trait AppendSink: Send + Sync {
    /// Append `lines` in order, each terminated by a newline.
    /// Returns the number of bytes written.
    async fn append(&self, lines: &[String]) -> Result<usize, SinkError>;

    /// Flush and release the underlying resource. Later appends fail with
    /// [`SinkError::Closed`].
    async fn close(&self) -> Result<(), SinkError>;

    /// Human-readable location, used in log messages.
    fn describe(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sink {0} is closed")]
    Closed(String),

    #[error("line {index} contains an embedded newline")]
    InvalidLine { index: usize },

    #[error("append task failed: {0}")]
    Task(String),
}

/// Join `lines` into a single newline-terminated buffer, rejecting lines that
/// would break the one-record-per-line format.
pub(crate) fn encode_lines(lines: &[String]) -> Result<Vec<u8>, SinkError> {
    let capacity = lines.iter().map(|l| l.len() + 1).sum();
    let mut buf = Vec::with_capacity(capacity);

    for (index, line) in lines.iter().enumerate() {
        if line.contains('\n') || line.contains('\r') {
            return Err(SinkError::InvalidLine { index });
        }
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }

    Ok(buf)
}
