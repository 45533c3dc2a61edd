//! Connection loop: accept, read once, respond once, close.
//!
//! # Responsibilities
//! - Accept connections through the bounded [`Listener`]
//! - Read one request chunk up to the configured byte budget
//! - Drive parse → access policy → pagination → record store → envelope
//! - Write the fully assembled reply and close the socket
//! - Keep the loop alive through every per-connection failure
//! - Stop accepting on shutdown and wait for in-flight connections
//!
//! # Design Decisions
//! - Each accepted connection runs in its own task holding a permit; with
//!   `max_connections = 1` that is still strictly one at a time
//! - The reply is written with a single `write_all` after it is complete
//! - Read and write deadlines are optional; `0` blocks indefinitely
//! - A request that fills the whole budget loses its unterminated last line
//! - Accept failures back off exponentially so a persistent error cannot spin

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::http::policy::{Access, AccessPolicy, ReadOnlyPolicy};
use crate::http::request::parse_request;
use crate::http::response::{ResponseEnvelope, Status};
use crate::lifecycle::ShutdownSignal;
use crate::net::{Connection, ConnectionPermit, ConnectionState, Listener};
use crate::observability::metrics;
use crate::store::{RecordStore, StoreError};

const ACCEPT_BACKOFF_BASE_MS: u64 = 10;
const ACCEPT_BACKOFF_MAX_MS: u64 = 1000;

/// Failure while talking to one client. Never fatal to the server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything a connection needs, shared read-only across connections.
#[derive(Debug)]
pub struct RequestHandler {
    store: RecordStore,
    policy: Arc<dyn AccessPolicy>,
    read_budget: usize,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl RequestHandler {
    /// Build a handler with the read-only GET policy.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_policy(config, Arc::new(ReadOnlyPolicy))
    }

    pub fn with_policy(config: &ServerConfig, policy: Arc<dyn AccessPolicy>) -> Self {
        Self {
            store: RecordStore::from_config(&config.dataset),
            policy,
            read_budget: config.listener.read_buffer_bytes,
            read_timeout: config.timeouts.read_timeout(),
            write_timeout: config.timeouts.write_timeout(),
        }
    }

    /// Turn raw request bytes into the reply to send, or `None` to close
    /// without replying.
    pub async fn respond(&self, raw: &[u8], conn: &mut Connection) -> Option<ResponseEnvelope> {
        let request = match parse_request(raw) {
            Ok(request) => request,
            Err(e) => {
                conn.advance(ConnectionState::ParseFailed);
                tracing::warn!(connection_id = %conn.id(), error = %e, "Malformed request");
                return e.reply_version().map(|version| {
                    ResponseEnvelope::rejection(
                        version,
                        Status::BadRequest,
                        format!("Malformed request: {}", e),
                    )
                });
            }
        };
        conn.advance(ConnectionState::Parsed);

        tracing::debug!(
            connection_id = %conn.id(),
            method = %request.method,
            path = %request.path,
            version = %request.version,
            headers = ?request.headers,
            "Parsed request"
        );

        if self.policy.check(&request.method) == Access::Denied {
            conn.advance(ConnectionState::Denied);
            tracing::info!(
                connection_id = %conn.id(),
                method = %request.method,
                "Method not allowed"
            );
            return Some(ResponseEnvelope::method_not_allowed(request.version));
        }
        conn.advance(ConnectionState::Allowed);

        let page = match request.pagination() {
            Ok(page) => page,
            Err(e) => {
                tracing::info!(connection_id = %conn.id(), error = %e, "Invalid pagination");
                return Some(ResponseEnvelope::rejection(
                    request.version,
                    Status::BadRequest,
                    e.to_string(),
                ));
            }
        };

        let fetched = self.store.fetch(&request.path, page.start, page.count).await;
        conn.advance(ConnectionState::Fetched);

        let envelope = match fetched {
            Ok(records) => ResponseEnvelope::success(request.version, &records),
            Err(e @ (StoreError::NotFound { .. } | StoreError::InvalidCategory { .. })) => {
                tracing::info!(connection_id = %conn.id(), error = %e, "Unknown category");
                ResponseEnvelope::rejection(request.version, Status::NotFound, e.to_string())
            }
            Err(e @ StoreError::Io { .. }) => {
                tracing::error!(connection_id = %conn.id(), error = %e, "Dataset read failed");
                ResponseEnvelope::rejection(
                    request.version,
                    Status::InternalServerError,
                    "Failed to read dataset",
                )
            }
        };

        Some(envelope)
    }

    /// Handle one connection from first read to close.
    pub async fn handle<S>(&self, mut stream: S, mut conn: Connection) -> Result<(), TransportError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; self.read_budget];
        let read = with_deadline(self.read_timeout, stream.read(&mut buf))
            .await
            .map_err(TransportError::ReadTimeout)??;

        if read == 0 {
            conn.advance(ConnectionState::Closed);
            metrics::record_dropped("empty");
            tracing::debug!(connection_id = %conn.id(), "Client closed before sending a request");
            return Ok(());
        }
        conn.advance(ConnectionState::Read);

        let mut raw = &buf[..read];
        if read == buf.len() {
            raw = complete_lines(raw);
            if raw.len() < read {
                tracing::debug!(
                    connection_id = %conn.id(),
                    dropped = read - raw.len(),
                    "Read budget exhausted, dropping unterminated last line"
                );
            }
        }
        tracing::debug!(
            connection_id = %conn.id(),
            bytes = read,
            request = %String::from_utf8_lossy(raw),
            "Received"
        );

        let Some(envelope) = self.respond(raw, &mut conn).await else {
            conn.advance(ConnectionState::Closed);
            metrics::record_dropped("unparseable");
            return Ok(());
        };

        let bytes = envelope.to_bytes();
        tracing::debug!(
            connection_id = %conn.id(),
            response = %String::from_utf8_lossy(&bytes),
            "Sending"
        );

        with_deadline(self.write_timeout, async {
            stream.write_all(&bytes).await?;
            stream.shutdown().await
        })
        .await
        .map_err(TransportError::WriteTimeout)??;
        conn.advance(ConnectionState::Responded);

        metrics::record_response(envelope.status.code(), conn.accepted_at());
        tracing::info!(
            connection_id = %conn.id(),
            status = envelope.status.code(),
            bytes = bytes.len(),
            elapsed_ms = conn.accepted_at().elapsed().as_millis() as u64,
            "Responded"
        );

        conn.advance(ConnectionState::Closed);
        Ok(())
    }
}

/// Cut `raw` back to just after its last `\n`.
///
/// Only applied when the read filled the budget: the final line may have been
/// split mid-value, so it must not be parsed as a complete header. Input with
/// no newline at all is returned unchanged.
fn complete_lines(raw: &[u8]) -> &[u8] {
    match raw.iter().rposition(|&byte| byte == b'\n') {
        Some(end) => &raw[..=end],
        None => raw,
    }
}

/// Delay before retrying after `failures` consecutive accept errors.
fn accept_backoff(failures: u32) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }
    let factor = 2u64.saturating_pow(failures - 1);
    let delay_ms = ACCEPT_BACKOFF_BASE_MS.saturating_mul(factor);
    Duration::from_millis(delay_ms.min(ACCEPT_BACKOFF_MAX_MS))
}

/// Await `fut`, giving up after `deadline` if one is set.
async fn with_deadline<F: std::future::Future>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<F::Output, Duration> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| limit),
        None => Ok(fut.await),
    }
}

/// The news content server.
pub struct ContentServer {
    handler: Arc<RequestHandler>,
}

impl ContentServer {
    /// Create a new server with the given configuration.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            handler: Arc::new(RequestHandler::new(config)),
        }
    }

    /// Run the accept loop until `shutdown` fires.
    ///
    /// Per-connection failures are logged and the loop continues; only the
    /// shutdown signal ends it. In-flight connections are awaited before
    /// returning.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "News server accepting connections");

        let mut failures = 0u32;
        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer, permit)) => {
                    failures = 0;
                    metrics::record_connection();
                    self.spawn_connection(stream, peer, permit);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = accept_backoff(failures);
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Accept failed"
                    );
                    tokio::select! {
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::info!("Stopped accepting, waiting for in-flight connections");
        listener.drain().await;
        tracing::info!("News server stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: tokio::net::TcpStream,
        peer: std::net::SocketAddr,
        permit: ConnectionPermit,
    ) {
        let handler = Arc::clone(&self.handler);
        let conn = Connection::new(peer);
        let span = tracing::info_span!("connection", id = %conn.id(), peer = %conn.peer());

        tokio::spawn(
            async move {
                let _permit = permit;
                let started = Instant::now();
                tracing::info!("Connected");

                if let Err(e) = handler.handle(stream, conn).await {
                    metrics::record_dropped("transport");
                    tracing::warn!(error = %e, "Connection abandoned");
                }

                tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Disconnected");
            }
            .instrument(span),
        );
    }
}
