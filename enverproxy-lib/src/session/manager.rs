//! The session-level proxy/dissector: spec.md §4.2 and §9's Design Notes.
//!
//! Each accepted client connection is driven by exactly one tokio task
//! (`Session::drive`), which owns its client socket and, when paired, its
//! upstream socket directly. `simulate` is plain task-local state rather
//! than an entry in a shared map, which is the simplification spec.md §9
//! calls out: it removes the three-parallel-maps consistency hazard without
//! changing any observable behavior, since no other task can ever race a
//! session's own downgrade-to-simulation transition.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::codec::{
    bridge_id, build_handshake_reply, build_payload_ack, classify, iter_payload_blocks,
    InverterRecord, Variant, BLOCK_LEN,
};
use crate::config::Config;
use crate::telemetry::Publisher;

use super::metrics::SessionCounters;

/// Offset of the 20-byte inverter record embedded in an EVB handshake
/// frame, per spec.md §4.2's classification matrix ("decode embedded 20B
/// record after offset 20").
const HANDSHAKE_RECORD_OFFSET: usize = 20;

/// How long to wait for the forward server to accept a connection before
/// treating the attempt as a failure and staying in (or falling back to)
/// simulation mode. Not a config key: spec.md §6 doesn't define one, and
/// this only bounds how long a single accept/retry blocks the session task.
const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Socket errors that mean "the peer is gone" per spec.md §7's `PeerGone`
/// taxonomy (`ENOTCONN`, `ECONNRESET`, `EBADF`). `std::io::ErrorKind` is the
/// portable surface for these rather than matching raw errno values.
fn is_peer_gone(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotConnected
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

enum UpstreamEvent {
    Data(usize),
    Gone,
    /// A non-peer-gone read error (spec.md §7's `OtherSocketError`): logged
    /// and paused for a second, but the upstream connection is left alone.
    TransientError(io::Error),
}

async fn poll_upstream(upstream: &mut Option<TcpStream>, buf: &mut [u8]) -> UpstreamEvent {
    match upstream {
        Some(u) => match u.read(buf).await {
            Ok(0) => UpstreamEvent::Gone,
            Ok(n) => UpstreamEvent::Data(n),
            Err(e) if is_peer_gone(&e) => UpstreamEvent::Gone,
            Err(e) => UpstreamEvent::TransientError(e),
        },
        None => std::future::pending().await,
    }
}

pub struct Session {
    client: TcpStream,
    client_addr: SocketAddr,
    upstream: Option<TcpStream>,
    simulate: bool,
    config: Arc<Config>,
    publisher: Arc<dyn Publisher>,
    metrics: Arc<SessionCounters>,
    shutdown: watch::Receiver<bool>,
}

impl Session {
    pub fn new(
        client: TcpStream,
        client_addr: SocketAddr,
        config: Arc<Config>,
        publisher: Arc<dyn Publisher>,
        metrics: Arc<SessionCounters>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            client_addr,
            upstream: None,
            simulate: true,
            config,
            publisher,
            metrics,
            shutdown,
        }
    }

    /// Attempt to open (or re-open) the upstream forward-server connection.
    /// Transitions `Pairing -> Paired` on success; stays `Simulating` on
    /// failure. Called once at session start and again on every client read
    /// while simulating, per spec.md §4.2's `process` bullet.
    async fn try_open_upstream(&mut self) {
        if self.upstream.is_some() {
            return;
        }
        let addr = self.config.forward_addr();
        match tokio::time::timeout(UPSTREAM_CONNECT_TIMEOUT, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => {
                info!(client = %self.client_addr, upstream = %addr, "opened forward-server connection");
                self.upstream = Some(stream);
                if self.simulate {
                    self.metrics.left_simulation();
                }
                self.simulate = false;
            }
            Ok(Err(e)) => {
                debug!(client = %self.client_addr, upstream = %addr, error = %e, "forward server unreachable, simulating");
            }
            Err(_) => {
                debug!(client = %self.client_addr, upstream = %addr, "forward server connect timed out, simulating");
            }
        }
    }

    /// Upstream died mid-session: close it, downgrade the client to
    /// simulation, and keep the client session alive (spec.md §4.2 `close`,
    /// §8 scenario 5).
    async fn downgrade(&mut self) {
        if let Some(mut upstream) = self.upstream.take() {
            let _ = upstream.shutdown().await;
        }
        if !self.simulate {
            self.simulate = true;
            self.metrics.entered_simulation();
            self.metrics.error();
            warn!(client = %self.client_addr, "upstream connection lost, downgrading to simulation");
        }
    }

    async fn publish_if_known(&self, record: InverterRecord) {
        if record.is_zero() {
            return;
        }
        if !self.config.knows(&record.wrid.to_string()) {
            warn!(wrid = %record.wrid, "telemetry for unmapped inverter dropped");
            return;
        }
        let topic = format!("enverbridge/{}", record.wrid);
        match serde_json::to_string(&record) {
            Ok(payload) => {
                if let Err(e) = self.publisher.publish(topic, payload).await {
                    warn!(wrid = %record.wrid, error = %e, "mqtt publish failed");
                }
            }
            Err(e) => warn!(wrid = %record.wrid, error = %e, "failed to encode telemetry payload"),
        }
    }

    /// Dissect device->upstream bytes and publish any telemetry found.
    /// Runs unconditionally, whether or not the pair is simulating — spec.md
    /// §3 says dissection never alters forwarded bytes and happens "in
    /// parallel" with forwarding.
    async fn dissect_client_frame(&self, variant: Variant, data: &[u8]) {
        match variant {
            Variant::HandshakeEvb => {
                if data.len() >= HANDSHAKE_RECORD_OFFSET + BLOCK_LEN {
                    let block = &data[HANDSHAKE_RECORD_OFFSET..HANDSHAKE_RECORD_OFFSET + BLOCK_LEN];
                    let brid = bridge_id(data).unwrap_or_default();
                    self.publish_if_known(InverterRecord::decode(block).with_brid(brid))
                        .await;
                }
            }
            v if v.is_payload() => {
                let brid = bridge_id(data).unwrap_or_default();
                for block in iter_payload_blocks(data) {
                    let record = InverterRecord::decode(block).with_brid(brid.clone());
                    self.publish_if_known(record).await;
                }
            }
            Variant::Unknown => {
                warn!(client = %self.client_addr, len = data.len(), "unrecognized frame");
            }
            _ => {}
        }
    }

    /// Process one read from the client socket: retry-open, dissect,
    /// forward-or-reply. Implements spec.md §4.2's `process` for client
    /// input.
    async fn handle_client_bytes(&mut self, data: &[u8]) {
        if self.simulate {
            self.try_open_upstream().await;
        }

        let variant = classify(data);
        self.dissect_client_frame(variant, data).await;

        if let Some(upstream) = self.upstream.as_mut() {
            match upstream.write_all(data).await {
                Ok(()) => {}
                Err(e) if is_peer_gone(&e) => self.downgrade().await,
                Err(e) => warn!(client = %self.client_addr, error = %e, "upstream write failed"),
            }
            return;
        }

        let reply = build_handshake_reply(data, Utc::now()).or_else(|| build_payload_ack(data));
        match reply {
            Some(reply) if reply.is_empty() => {
                warn!(client = %self.client_addr, "synthetic reply was empty");
            }
            Some(reply) => {
                if let Err(e) = self.client.write_all(&reply).await {
                    warn!(client = %self.client_addr, error = %e, "failed to send synthetic reply");
                }
            }
            None => {}
        }
    }

    /// Process one read from the upstream socket: log-only classification,
    /// then forward verbatim to the client. Returns `false` if the client
    /// is gone and the session should end.
    async fn handle_upstream_bytes(&mut self, data: &[u8]) -> bool {
        let variant = classify(data);
        debug!(client = %self.client_addr, variant = variant.name(), "upstream frame");
        match self.client.write_all(data).await {
            Ok(()) => true,
            Err(e) => {
                warn!(client = %self.client_addr, error = %e, "client write failed, ending session");
                false
            }
        }
    }

    /// Drive the session until the client socket closes or errors fatally.
    /// This is the per-connection task body; there is no shared reactor
    /// tick, so "dispatch" is just this loop's own `select!`.
    pub async fn drive(mut self) {
        self.metrics.session_opened();
        self.try_open_upstream().await;
        if self.simulate {
            self.metrics.entered_simulation();
        }

        let buffer_size = self.config.buffer_size.max(1);
        let mut client_buf = vec![0u8; buffer_size];
        let mut upstream_buf = vec![0u8; buffer_size];

        loop {
            tokio::select! {
                result = self.client.read(&mut client_buf) => {
                    match result {
                        Ok(0) => break,
                        Ok(n) => {
                            let data = client_buf[..n].to_vec();
                            self.handle_client_bytes(&data).await;
                        }
                        Err(e) if is_peer_gone(&e) => break,
                        Err(e) => {
                            warn!(client = %self.client_addr, error = %e, "client read error");
                            self.metrics.error();
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
                event = poll_upstream(&mut self.upstream, &mut upstream_buf) => {
                    match event {
                        UpstreamEvent::Data(n) => {
                            let data = upstream_buf[..n].to_vec();
                            if !self.handle_upstream_bytes(&data).await {
                                break;
                            }
                        }
                        UpstreamEvent::Gone => self.downgrade().await,
                        UpstreamEvent::TransientError(e) => {
                            warn!(client = %self.client_addr, error = %e, "upstream read error, pausing");
                            self.metrics.error();
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
                // close_all on SIGTERM/SIGINT (spec.md §4.2): discard
                // whatever was in flight and close both sockets below.
                changed = self.shutdown.changed() => {
                    if changed.is_ok() && *self.shutdown.borrow() {
                        info!(client = %self.client_addr, "closing session for shutdown");
                        break;
                    }
                }
            }
        }

        if let Some(mut upstream) = self.upstream.take() {
            let _ = upstream.shutdown().await;
        }
        let _ = self.client.shutdown().await;
        self.metrics.session_closed();
        info!(client = %self.client_addr, "session closed");
    }
}
