use crate::config::{load_config, Config, ConfigError};
use crate::generator::{run_heartbeat, Generator};
use crate::sink::{AppendSink, FileSink, SinkError};
use crate::web::{build_router, run_server, AppState};
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("startup failed: cannot open {log} at {path}: {source}")]
    Startup {
        log: &'static str,
        path: PathBuf,
        #[source]
        source: SinkError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("web server error: {0}")]
    WebServer(#[from] std::io::Error),

    #[error("failed to close {log}: {source}")]
    Close {
        log: &'static str,
        #[source]
        source: SinkError,
    },

    #[error("task join error: {0}")]
    Join(#[from] JoinError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match &config_path {
        Some(path) => info!(config_path = %path.display(), "Loading configuration"),
        None => info!("No config file found, using defaults and environment"),
    }

    let config = load_config(config_path.as_deref())?;
    run_until(config, shutdown_signal()).await?;
    Ok(())
}

/// Run the service until `signal` resolves or the HTTP server stops on its
/// own, then shut everything down in order.
pub async fn run_until<F>(config: Config, signal: F) -> Result<(), RunError>
where
    F: Future<Output = ()>,
{
    let mut service = start(&config).await?;
    info!("Service started, press Ctrl+C to shutdown");

    tokio::select! {
        _ = signal => {
            info!("Shutdown signal received");
            service.shutdown().await
        }
        result = &mut service.server => {
            warn!("HTTP server exited unexpectedly");
            service.finish(result).await
        }
    }
}

/// A started service: sinks open, heartbeat running, server accepting.
pub struct RunningService {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<Result<(), std::io::Error>>,
    heartbeat: Option<JoinHandle<()>>,
    app_sink: Arc<FileSink>,
    received_sink: Arc<FileSink>,
    generator: Arc<Generator>,
}

/// Open both sinks, start the heartbeat task and bind the HTTP server.
///
/// Failing to open either log file is fatal: nothing is started.
pub async fn start(config: &Config) -> Result<RunningService, RunError> {
    let app_path = config.app_log_path();
    let received_path = config.received_log_path();

    info!(path = %app_path.display(), "Opening app log");
    let app_sink = Arc::new(FileSink::open(&app_path).map_err(|source| RunError::Startup {
        log: "app log",
        path: app_path.clone(),
        source,
    })?);

    info!(path = %received_path.display(), "Opening received log");
    let received_sink =
        Arc::new(
            FileSink::open(&received_path).map_err(|source| RunError::Startup {
                log: "received log",
                path: received_path.clone(),
                source,
            })?,
        );

    let listener = TcpListener::bind(&config.web.listen)
        .await
        .map_err(|source| RunError::Bind {
            addr: config.web.listen.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app_log: Arc<dyn AppendSink> = app_sink.clone();
    let generator = Arc::new(Generator::new(app_log, config.generator.clone()));

    let heartbeat = if config.generator.heartbeat_enabled {
        info!("Starting heartbeat task");
        let heartbeat_generator = Arc::clone(&generator);
        let heartbeat_shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            run_heartbeat(heartbeat_generator, heartbeat_shutdown).await
        }))
    } else {
        info!("Heartbeat disabled");
        None
    };

    let state = AppState {
        received: received_sink.clone(),
        generator: Arc::clone(&generator),
    };
    let app = build_router(state, config.ingest.max_body_bytes);

    info!(addr = %local_addr, "Starting web server");
    let server = tokio::spawn(async move { run_server(listener, app, shutdown_rx).await });

    Ok(RunningService {
        local_addr,
        shutdown_tx,
        server,
        heartbeat,
        app_sink,
        received_sink,
        generator,
    })
}

impl RunningService {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn generator(&self) -> &Arc<Generator> {
        &self.generator
    }

    /// Stop accepting requests, drain in-flight ones, stop the heartbeat,
    /// then flush and close both log files.
    pub async fn shutdown(mut self) -> Result<(), RunError> {
        let _ = self.shutdown_tx.send(true);
        let server_result = (&mut self.server).await;
        self.finish(server_result).await
    }

    async fn finish(
        self,
        server_result: Result<Result<(), std::io::Error>, JoinError>,
    ) -> Result<(), RunError> {
        let _ = self.shutdown_tx.send(true);

        match &server_result {
            Ok(Ok(())) => info!("Web server stopped"),
            Ok(Err(e)) => error!(error = %e, "Web server error"),
            Err(e) => error!(error = %e, "Web server task join error"),
        }

        if let Some(handle) = self.heartbeat {
            match handle.await {
                Ok(()) => info!("Heartbeat task completed"),
                Err(e) => error!(error = %e, "Heartbeat task join error"),
            }
        }

        let app_closed = self.app_sink.close().await;
        let received_closed = self.received_sink.close().await;

        info!("Shutdown complete");

        server_result??;
        app_closed.map_err(|source| RunError::Close {
            log: "app log",
            source,
        })?;
        received_closed.map_err(|source| RunError::Close {
            log: "received log",
            source,
        })?;
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix (what container runtimes send).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
