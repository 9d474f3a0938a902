pub mod event;
pub mod runner;

pub use event::{AppEvent, Level};
pub use runner::run_heartbeat;

use crate::config::GeneratorConfig;
use crate::sink::{AppendSink, SinkError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to append to app log: {0}")]
    Sink(#[from] SinkError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstReport {
    pub request_id: Uuid,
    pub generated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditReport {
    pub audit: usize,
    pub non_audit: usize,
}

/// Produces the synthetic application log the forwarder tails.
///
/// All output goes through one sink, so heartbeats and on-demand bursts are
/// each written atomically relative to one another.
pub struct Generator {
    sink: Arc<dyn AppendSink>,
    config: GeneratorConfig,
    host: String,
    heartbeats: Mutex<u64>,
}

impl Generator {
    pub fn new(sink: Arc<dyn AppendSink>, config: GeneratorConfig) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        Self {
            sink,
            config,
            host,
            heartbeats: Mutex::new(0),
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.heartbeat_interval
    }

    pub fn burst_size(&self) -> usize {
        self.config.burst_size
    }

    /// Number of heartbeats successfully written so far.
    pub async fn counter(&self) -> u64 {
        *self.heartbeats.lock().await
    }

    /// Write the next heartbeat. The counter only advances once the line is
    /// durable, so a failed tick is retried with the same number.
    pub async fn heartbeat(&self) -> Result<u64, GeneratorError> {
        let mut counter = self.heartbeats.lock().await;
        let next = *counter + 1;

        let event = event::heartbeat(&self.config.component, &self.host, next);
        self.emit(std::slice::from_ref(&event)).await?;

        *counter = next;
        Ok(next)
    }

    /// Write `burst_size` synthetic request records in one append.
    pub async fn burst(&self) -> Result<BurstReport, GeneratorError> {
        let request_id = Uuid::new_v4();
        let events = {
            let mut rng = fastrand::Rng::new();
            event::burst(&mut rng, &self.config.component, self.config.burst_size, request_id)
        };

        self.emit(&events).await?;

        Ok(BurstReport {
            request_id,
            generated: events.len(),
        })
    }

    /// Write the `[audit]` demonstration mix in one append.
    pub async fn audit(&self) -> Result<AuditReport, GeneratorError> {
        let (audit, plain) = {
            let mut rng = fastrand::Rng::new();
            event::audit_mix(&mut rng, &self.config.component)
        };

        let report = AuditReport {
            audit: audit.len(),
            non_audit: plain.len(),
        };

        let events: Vec<AppEvent> = audit.into_iter().chain(plain).collect();
        self.emit(&events).await?;

        Ok(report)
    }

    async fn emit(&self, events: &[AppEvent]) -> Result<(), GeneratorError> {
        let lines = events
            .iter()
            .map(AppEvent::to_line)
            .collect::<Result<Vec<_>, _>>()?;

        self.sink.append(&lines).await?;

        for event in events {
            mirror(event);
        }
        Ok(())
    }
}

/// Echo a generated event to the service's own log at its level.
fn mirror(event: &AppEvent) {
    match event.level {
        Level::Info => info!(target: "logreceiver::app", "{}", event.message),
        Level::Warning => warn!(target: "logreceiver::app", "{}", event.message),
        Level::Error => error!(target: "logreceiver::app", "{}", event.message),
    }
}
