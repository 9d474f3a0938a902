pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# LOGRECEIVER CONFIGURATION
# =============================================================================
# Every key is optional. Missing keys fall back to the defaults shown here.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/logreceiver/config.yml
#   3. /etc/logreceiver/config.yml
#
# Environment variables override the file:
#   LOG_ROOT, APP_LOG_PATH, RECEIVED_LOG_PATH, PORT,
#   HEARTBEAT_INTERVAL (e.g. "5s" or "5"), BURST_SIZE
#
# Values may reference the environment with $env{VAR_NAME}.

# =============================================================================
# PATHS
# =============================================================================
paths:
  # Base directory for both log files
  log_root: /logs
  # Synthetic application log (the forwarder tails this file).
  # Defaults to <log_root>/app/app.log
  # app_log: /logs/app/app.log
  # Records received on POST /ingest, one JSON object per line.
  # Defaults to <log_root>/received/ingest.log
  # received_log: /logs/received/ingest.log

# =============================================================================
# WEB
# =============================================================================
# The forwarder's HTTP output should point at this address, e.g. for Fluent Bit:
#
#   [OUTPUT]
#       Name   http
#       Match  *
#       Host   receiver
#       Port   8006
#       URI    /ingest
#       Format json
web:
  listen: "0.0.0.0:8006"

# =============================================================================
# INGEST
# =============================================================================
ingest:
  # Bodies larger than this are rejected with 413 and nothing is written
  max_body_bytes: 10485760

# =============================================================================
# GENERATOR
# =============================================================================
generator:
  # Append a heartbeat line to the app log on a fixed interval
  heartbeat_enabled: true
  heartbeat_interval: 5s
  # Number of records written by GET /test-logs (1 to 1000)
  burst_size: 4
  # Value of the "component" field on generated lines
  component: demo-app
"#
    .to_string()
}
