// src/cdr/server.rs
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cdr::framer::LineFramer;
use crate::cdr::parser::parse_cdr_line;
use crate::cdr::recorder::CdrRecorder;
use crate::error::{IngestError, StoreError};

const ACK: &[u8] = b"OK\n";
const LOG_PREVIEW_CHARS: usize = 100;

/// TCP listener for PBX CDR streams. Bound first, started second, so a
/// bind failure surfaces to the caller before any task is spawned.
pub struct CdrServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    recorder: Arc<CdrRecorder>,
    max_inflight_writes: usize,
}

impl CdrServer {
    pub async fn bind(
        addr: &str,
        recorder: Arc<CdrRecorder>,
        max_inflight_writes: usize,
    ) -> Result<Self, IngestError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| IngestError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            recorder,
            max_inflight_writes,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the accept loop and hands ownership of the server's
    /// lifetime to the returned handle.
    pub fn start(self) -> CdrServerHandle {
        let local_addr = self.local_addr;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let recorder = self.recorder;
        let listener = self.listener;
        let max_inflight = self.max_inflight_writes;

        let accept_task = tokio::spawn(async move {
            info!("📞 CDR server listening on {}", local_addr);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        info!("CDR server stopping");
                        break;
                    }
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((socket, addr)) => {
                                info!("CDR client connected: {}", addr);
                                let recorder = recorder.clone();
                                tokio::spawn(async move {
                                    if let Err(e) =
                                        handle_connection(socket, recorder, max_inflight).await
                                    {
                                        error!("CDR socket error from {}: {}", addr, e);
                                    }
                                    info!("CDR client disconnected: {}", addr);
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept CDR connection: {}", e);
                            }
                        }
                    }
                }
            }
        });

        CdrServerHandle {
            local_addr,
            shutdown_tx,
            accept_task,
        }
    }
}

/// Owned lifecycle of a running CDR server. `shutdown` stops the accept
/// loop and waits for it; dropping the handle stops it too, without the
/// wait. Connections already accepted finish on their own tasks either
/// way.
pub struct CdrServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

impl CdrServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections. Persistence writes already
    /// dispatched on live connections run to completion on the runtime.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.accept_task.await;
    }
}

/// One task per connection: ack, then frame, parse, and dispatch each
/// line in wire order. The semaphore caps persistence writes in flight
/// for this connection; framing stalls once the cap is reached rather
/// than queueing unboundedly ahead of a slow store.
async fn handle_connection(
    mut socket: TcpStream,
    recorder: Arc<CdrRecorder>,
    max_inflight_writes: usize,
) -> Result<(), IngestError> {
    // Liveness handshake, not a per-record receipt.
    socket.write_all(ACK).await?;

    let mut framer = LineFramer::new();
    let inflight = Arc::new(Semaphore::new(max_inflight_writes));
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        for line in framer.push(&buf[..n]) {
            // Skip blank keep-alive lines, but hand the line to the
            // parser untouched: tabs are field separators, and a line
            // ending in empty fields ends in tabs.
            if line.trim().is_empty() {
                continue;
            }
            dispatch_line(&line, &recorder, &inflight).await;
        }
    }

    if framer.pending() > 0 {
        // Policy: an unterminated trailing fragment is dropped, never
        // parsed as if it were complete.
        warn!(
            "Discarding {} unterminated bytes at connection close",
            framer.pending()
        );
    }

    Ok(())
}

/// Parses a line and, if it validates, dispatches its persistence write
/// under an in-flight permit. Returns once the write is dispatched;
/// completion happens on its own task and may interleave with later
/// lines.
async fn dispatch_line(line: &str, recorder: &Arc<CdrRecorder>, inflight: &Arc<Semaphore>) {
    let cdr = match parse_cdr_line(line) {
        Ok(cdr) => cdr,
        Err(rejection) => {
            warn!("Dropping CDR line ({}): {}", rejection, preview(line));
            return;
        }
    };

    // The semaphore lives as long as the connection and is never
    // closed, so acquisition only ends by a permit becoming free.
    let permit = match inflight.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return,
    };
    let recorder = recorder.clone();
    let call_id = cdr.call_id.clone();

    tokio::spawn(async move {
        let _permit = permit;
        match recorder.record(cdr).await {
            Ok(_) => {}
            Err(StoreError::Unavailable(e)) => {
                // Escalation channel for external monitoring; the
                // connection itself keeps flowing.
                error!("Store unavailable, dropping CDR {}: {}", call_id, e);
            }
            Err(e) => {
                warn!("Failed to persist CDR {}, dropping line: {}", call_id, e);
            }
        }
    });
}

/// First 100 chars of a line for log output, the rest elided.
fn preview(line: &str) -> String {
    let mut out: String = line.chars().take(LOG_PREVIEW_CHARS).collect();
    if line.chars().count() > LOG_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}
