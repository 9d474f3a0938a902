use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub const LOGGER_NAME: &str = "app";

pub const ACTIONS: [&str; 6] = [
    "login",
    "logout",
    "view_profile",
    "update_settings",
    "search",
    "delete",
];

pub const FAILURES: [&str; 4] = [
    "Database connection timeout",
    "Upstream service unavailable",
    "Disk quota exceeded",
    "Cache write rejected",
];

const RESOURCES: [&str; 4] = ["profile", "settings", "billing", "projects"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    /// Weighted pick: 70% info, 20% warning, 10% error.
    pub fn weighted(rng: &mut fastrand::Rng) -> Self {
        match rng.u8(0..10) {
            0..=6 => Level::Info,
            7..=8 => Level::Warning,
            _ => Level::Error,
        }
    }
}

/// One line of the synthetic application log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppEvent {
    pub timestamp: f64,
    pub level: Level,
    pub logger: String,
    pub component: String,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AppEvent {
    pub fn new(level: Level, component: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: now_seconds(),
            level,
            logger: LOGGER_NAME.to_string(),
            component: component.to_string(),
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Seconds since the epoch with microsecond precision.
pub fn now_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub fn heartbeat(component: &str, host: &str, counter: u64) -> AppEvent {
    AppEvent::new(Level::Info, component, format!("heartbeat {}", counter))
        .with_field("event", json!("heartbeat"))
        .with_field("counter", json!(counter))
        .with_field("host", json!(host))
}

/// Build `size` independent synthetic request records sharing one request id.
pub fn burst(rng: &mut fastrand::Rng, component: &str, size: usize, request_id: Uuid) -> Vec<AppEvent> {
    (0..size)
        .map(|_| {
            let user_id = rng.u32(1000..=9999);
            let action = ACTIONS[rng.usize(..ACTIONS.len())];
            let level = Level::weighted(rng);

            let event = match level {
                Level::Info => AppEvent::new(
                    level,
                    component,
                    format!("User {} performed action: {}", user_id, action),
                ),
                Level::Warning => AppEvent::new(
                    level,
                    component,
                    format!(
                        "Rate limit check for user {}: {}/10 requests",
                        user_id,
                        rng.u8(1..=10)
                    ),
                ),
                Level::Error => {
                    let failure = FAILURES[rng.usize(..FAILURES.len())];
                    AppEvent::new(
                        level,
                        component,
                        format!("Simulated error: {} for user {}", failure, user_id),
                    )
                    .with_field("error", json!(failure))
                }
            };

            event
                .with_field("event", json!("request"))
                .with_field("request_id", json!(request_id.to_string()))
                .with_field("user_id", json!(user_id))
                .with_field("action", json!(action))
        })
        .collect()
}

/// Two `[audit]` lines followed by two ordinary lines, for exercising
/// forwarder-side grep filters.
pub fn audit_mix(rng: &mut fastrand::Rng, component: &str) -> (Vec<AppEvent>, Vec<AppEvent>) {
    let user_id = rng.u32(1000..=9999);
    let resource = RESOURCES[rng.usize(..RESOURCES.len())];

    let audit = vec![
        AppEvent::new(
            Level::Info,
            component,
            format!("[audit] user={} action=read resource={}", user_id, resource),
        ),
        AppEvent::new(
            Level::Info,
            component,
            format!(
                "[audit] user={} action=update resource={} result=success",
                user_id, resource
            ),
        ),
    ];

    let plain = vec![
        AppEvent::new(
            Level::Info,
            component,
            format!("User {} viewed the {} page", user_id, resource),
        ),
        AppEvent::new(
            Level::Warning,
            component,
            format!("Cache miss for user {} {}", user_id, resource),
        ),
    ];

    (audit, plain)
}
