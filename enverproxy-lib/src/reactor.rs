//! The accept loop: spec.md §4.2 `accept`, grounded on the teacher's
//! `proxy::server::run` signal-handling and `select!` shape, simplified
//! because each connection now owns its own task end-to-end instead of
//! sharing a connection-limit counter and TLS acceptor.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::session::{Session, SessionCounters};
use crate::telemetry::Publisher;

pub struct Reactor {
    config: Arc<Config>,
    publisher: Arc<dyn Publisher>,
    metrics: Arc<SessionCounters>,
}

impl Reactor {
    pub fn new(config: Arc<Config>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            config,
            publisher,
            metrics: Arc::new(SessionCounters::default()),
        }
    }

    pub fn metrics(&self) -> Arc<SessionCounters> {
        self.metrics.clone()
    }

    /// Bind the listen port and run the accept loop until SIGTERM/SIGINT.
    /// Every accepted connection gets its own `Session` task; there is no
    /// shared per-pair state to guard, so the loop itself stays small.
    pub async fn run(&self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.config.listen_port);
        let listener = TcpListener::bind(&addr).await.map_err(ProxyError::Io)?;
        info!(%addr, "enverproxy listening");

        let mut sigterm = signal(SignalKind::terminate()).map_err(ProxyError::Io)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(ProxyError::Io)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sessions = Vec::new();

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("received SIGINT, shutting down");
                    break;
                }
                result = listener.accept() => {
                    let (client, client_addr) = match result {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "accept error");
                            continue;
                        }
                    };
                    info!(client = %client_addr, "accepted connection");

                    let session = Session::new(
                        client,
                        client_addr,
                        self.config.clone(),
                        self.publisher.clone(),
                        self.metrics.clone(),
                        shutdown_rx.clone(),
                    );
                    sessions.push(tokio::spawn(session.drive()));
                    sessions.retain(|handle| !handle.is_finished());
                }
            }
        }

        // close_all: tell every live session to close its sockets, then wait
        // for an orderly shutdown before the process exits (spec.md §7).
        let _ = shutdown_tx.send(true);
        for handle in sessions {
            let _ = handle.await;
        }
        Ok(())
    }
}
