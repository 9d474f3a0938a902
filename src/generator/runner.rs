use super::Generator;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Emit a heartbeat every configured interval until shutdown is signalled.
///
/// The first heartbeat is written immediately. Append failures are logged and
/// the next tick tries again; they never end the task. A heartbeat already in
/// flight when shutdown arrives is allowed to finish.
pub async fn run_heartbeat(generator: Arc<Generator>, mut shutdown_rx: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(generator.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval = ?generator.interval(), "Heartbeat task started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => {
                match generator.heartbeat().await {
                    Ok(counter) => debug!(counter, "Heartbeat written"),
                    Err(e) => warn!(error = %e, "Heartbeat failed, retrying next interval"),
                }
            }
        }
    }

    let heartbeats = generator.counter().await;
    info!(heartbeats, "Heartbeat task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::sink::MemorySink;
    use serde_json::Value;
    use std::time::Duration;

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_heartbeat_future_is_send() {
        let generator = Arc::new(Generator::new(
            Arc::new(MemorySink::new()),
            GeneratorConfig::default(),
        ));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = run_heartbeat(generator, shutdown_rx);
        assert_send(&task);
    }

    #[tokio::test]
    async fn test_heartbeat_stops_when_sender_dropped() {
        let sink = Arc::new(MemorySink::new());
        let config = GeneratorConfig {
            heartbeat_interval: Duration::from_millis(10),
            ..GeneratorConfig::default()
        };
        let generator = Arc::new(Generator::new(sink, config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_heartbeat(generator, shutdown_rx));
        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_heartbeat_runs_until_shutdown() {
        let sink = Arc::new(MemorySink::new());
        let config = GeneratorConfig {
            heartbeat_interval: Duration::from_millis(20),
            ..GeneratorConfig::default()
        };
        let generator = Arc::new(Generator::new(sink.clone(), config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_heartbeat(Arc::clone(&generator), shutdown_rx));
        tokio::time::sleep(Duration::from_millis(110)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        let counters: Vec<u64> = sink
            .lines()
            .iter()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["counter"].as_u64().unwrap())
            .collect();
        assert!(counters.len() >= 2, "only {} heartbeats", counters.len());
        assert!(counters.windows(2).all(|w| w[1] > w[0]));

        let after_stop = sink.lines().len();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(sink.lines().len(), after_stop);
    }

    #[tokio::test]
    async fn test_heartbeat_survives_sink_failures() {
        let sink = Arc::new(MemorySink::new());
        sink.set_failing(true);
        let config = GeneratorConfig {
            heartbeat_interval: Duration::from_millis(10),
            ..GeneratorConfig::default()
        };
        let generator = Arc::new(Generator::new(sink.clone(), config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_heartbeat(Arc::clone(&generator), shutdown_rx));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!handle.is_finished());

        sink.set_failing(false);
        tokio::time::sleep(Duration::from_millis(40)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(generator.counter().await >= 1);
        assert_eq!(
            serde_json::from_str::<Value>(&sink.lines()[0]).unwrap()["counter"],
            1
        );
    }
}
