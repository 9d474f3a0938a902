pub mod payload;
pub mod record;

pub use payload::{BodyFormat, IngestPayload, PayloadError};
pub use record::LogRecord;

use crate::sink::{AppendSink, SinkError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] PayloadError),

    #[error("failed to encode record {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist records: {0}")]
    Sink(#[from] SinkError),
}

/// Result of one successful ingest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub records: usize,
    pub bytes: usize,
}

/// Decode `body`, then append every record to `sink` as one contiguous write.
///
/// The body is fully validated before the sink is touched, so a rejected
/// request never leaves a partial batch behind.
pub async fn ingest_body(
    sink: &dyn AppendSink,
    format: BodyFormat,
    body: &[u8],
) -> Result<IngestOutcome, IngestError> {
    let records = IngestPayload::decode(body, format)?.into_records();
    ingest_records(sink, &records).await
}

/// Append already-decoded records, preserving their order.
pub async fn ingest_records(
    sink: &dyn AppendSink,
    records: &[LogRecord],
) -> Result<IngestOutcome, IngestError> {
    let lines = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .to_line()
                .map_err(|source| IngestError::Encode { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let bytes = sink.append(&lines).await?;

    for line in &lines {
        debug!(target: "logreceiver::ingest::echo", "INGEST: {}", line);
    }
    info!(
        records = lines.len(),
        bytes,
        sink = %sink.describe(),
        "Ingested batch"
    );

    Ok(IngestOutcome {
        records: lines.len(),
        bytes,
    })
}
