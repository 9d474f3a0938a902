use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names the producer may use for the record timestamp, in lookup order.
const TIMESTAMP_KEYS: [&str; 2] = ["timestamp", "date"];
/// Field names the producer may use for the payload, in lookup order.
const MESSAGE_KEYS: [&str; 2] = ["message", "log"];

/// One structured log record: a JSON object, kept exactly as received.
///
/// There are no mutators. Everything other than the well-known timestamp and
/// message fields is treated as an opaque tag and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord(Map<String, Value>);

impl LogRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Producer-assigned timestamp in fractional seconds since the epoch.
    pub fn timestamp(&self) -> Option<f64> {
        TIMESTAMP_KEYS
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_f64))
    }

    pub fn message(&self) -> Option<&Value> {
        MESSAGE_KEYS.iter().find_map(|key| self.0.get(*key))
    }

    /// Routing tag attached by the forwarder (e.g. `app.log`, `metrics.cpu`).
    pub fn tag(&self) -> Option<&str> {
        self.0.get("tag").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Compact single-line JSON encoding, key order preserved.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl From<Map<String, Value>> for LogRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> LogRecord {
        match value {
            Value::Object(map) => LogRecord::new(map),
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_forwarder_field_names() {
        let rec = record(json!({"date": 1718000000.25, "log": "hello", "tag": "app.log"}));
        assert_eq!(rec.timestamp(), Some(1718000000.25));
        assert_eq!(rec.message(), Some(&json!("hello")));
        assert_eq!(rec.tag(), Some("app.log"));
    }

    #[test]
    fn test_timestamp_prefers_explicit_field() {
        let rec = record(json!({"date": 1.0, "timestamp": 2.0}));
        assert_eq!(rec.timestamp(), Some(2.0));
    }

    #[test]
    fn test_structured_metric_message() {
        let rec = record(json!({
            "date": 1718000000.0,
            "cpu_p": 3.5,
            "cpu0.p_cpu": 2.0,
            "tag": "metrics.cpu"
        }));
        assert!(rec.message().is_none());
        assert_eq!(rec.get("cpu0.p_cpu"), Some(&json!(2.0)));
    }

    #[test]
    fn test_to_line_is_compact_and_ordered() {
        let rec: LogRecord =
            serde_json::from_str(r#"{ "z": 1,  "a": {"nested": [1, 2]}, "m": "x\ny" }"#).unwrap();
        assert_eq!(
            rec.to_line().unwrap(),
            r#"{"z":1,"a":{"nested":[1,2]},"m":"x\ny"}"#
        );
    }

    #[test]
    fn test_numbers_pass_through_verbatim() {
        let raw = r#"{"trace_id":123456789012345678901234567890,"ratio":0.10000000000000000555}"#;
        let rec: LogRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(rec.to_line().unwrap(), raw);
    }
}
