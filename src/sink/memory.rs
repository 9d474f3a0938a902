use super::traits::{encode_lines, AppendSink, SinkError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory sink, used to exercise handlers without touching disk.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    closed: AtomicBool,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Make subsequent appends fail with an I/O error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl AppendSink for MemorySink {
    async fn append(&self, lines: &[String]) -> Result<usize, SinkError> {
        let buf = encode_lines(lines)?;

        if self.closed.load(Ordering::SeqCst) {
            return Err(SinkError::Closed(self.describe()));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Io {
                path: self.describe(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "simulated write failure"),
            });
        }

        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(lines);
        Ok(buf.len())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
