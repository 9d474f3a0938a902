use super::record::LogRecord;
use serde_json::Value;
use thiserror::Error;

/// Reasons a request body is rejected before anything is written.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("expected a JSON object or an array of objects, got {0}")]
    UnexpectedShape(&'static str),

    #[error("element {index} of the batch is {kind}, expected an object")]
    NonObjectElement { index: usize, kind: &'static str },

    #[error("line {line} is not a JSON object: {reason}")]
    InvalidLine { line: usize, reason: String },
}

/// Body wire format, chosen from the request's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// One JSON value: an object or an array of objects.
    Json,
    /// Newline-delimited JSON objects.
    JsonLines,
}

impl BodyFormat {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("application/x-ndjson")
            | Some("application/jsonlines")
            | Some("application/json-lines")
            | Some("application/jsonl") => BodyFormat::JsonLines,
            _ => BodyFormat::Json,
        }
    }
}

/// A decoded ingest request body.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestPayload {
    Single(LogRecord),
    Batch(Vec<LogRecord>),
}

impl IngestPayload {
    /// Decode and validate a whole body. Either every element is a valid
    /// record or the body is rejected.
    pub fn decode(body: &[u8], format: BodyFormat) -> Result<Self, PayloadError> {
        match format {
            BodyFormat::Json => Self::decode_json(body),
            BodyFormat::JsonLines => Self::decode_json_lines(body),
        }
    }

    fn decode_json(body: &[u8]) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_slice(body).map_err(PayloadError::InvalidJson)?;

        match value {
            Value::Object(map) => Ok(IngestPayload::Single(LogRecord::new(map))),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Object(map) => Ok(LogRecord::new(map)),
                    other => Err(PayloadError::NonObjectElement {
                        index,
                        kind: kind_of(&other),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(IngestPayload::Batch),
            other => Err(PayloadError::UnexpectedShape(kind_of(&other))),
        }
    }

    fn decode_json_lines(body: &[u8]) -> Result<Self, PayloadError> {
        let text = std::str::from_utf8(body).map_err(|e| PayloadError::InvalidLine {
            line: 1 + body[..e.valid_up_to()].iter().filter(|b| **b == b'\n').count(),
            reason: "invalid UTF-8".to_string(),
        })?;

        let mut records = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }

            let line = i + 1;
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => records.push(LogRecord::new(map)),
                Ok(other) => {
                    return Err(PayloadError::InvalidLine {
                        line,
                        reason: format!("got {}", kind_of(&other)),
                    })
                }
                Err(e) => {
                    return Err(PayloadError::InvalidLine {
                        line,
                        reason: e.to_string(),
                    })
                }
            }
        }

        Ok(IngestPayload::Batch(records))
    }

    /// Normalize to a sequence; a single object is a batch of one.
    pub fn into_records(self) -> Vec<LogRecord> {
        match self {
            IngestPayload::Single(record) => vec![record],
            IngestPayload::Batch(records) => records,
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
