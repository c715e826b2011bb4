// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transport worker owning the control-plane connection.
//!
//! The worker maintains exactly one logical connection at a time:
//! `Disconnected -> Connecting -> Connected -> Disconnected`, starting
//! disconnected. Every entry into the disconnected state schedules a redial
//! after a constant short delay; there is no backoff and the worker retries
//! forever. The control-plane lives on the same trusted network, so
//! connection-refused failures are expected during restarts and are
//! swallowed silently.
//!
//! The worker runs as a dedicated task and talks to the orchestrator only
//! through channels, so a socket stall or reconnect loop never blocks
//! request handling.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};

use renderline_protocol::frame::{Frame, FrameError, FrameType, read_frame, write_frame};

/// Configuration for the transport worker.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Control-plane address to dial.
    pub server_addr: SocketAddr,
    /// Bearer token presented immediately after connect.
    pub token: String,
    /// Constant delay between reconnect attempts.
    pub reconnect_delay: Duration,
}

/// Events the worker forwards to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// The connection came up. Emitted exactly once per transition.
    Connected,
    /// The connection went down. Only emitted after a prior `Connected`,
    /// so repeated failed dial attempts stay quiet.
    Disconnected,
    /// An application frame, forwarded verbatim.
    Text(String),
    /// A transport-level diagnostic that is not expected outage noise.
    Diagnostic(String),
}

/// Control requests the orchestrator can send to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Opportunistic liveness probe. Sent as a transport ping when
    /// connected; silently dropped otherwise. Never triggers a reconnect.
    Probe,
    /// Cancel any pending retry timer and redial immediately.
    Reconnect,
}

/// What to do after a serve loop or wait ends.
enum Next {
    Redial,
    Stop,
}

/// Worker that owns the single control-plane connection.
pub struct TransportWorker {
    config: TransportConfig,
    events: mpsc::Sender<WorkerEvent>,
    control: mpsc::Receiver<ControlRequest>,
    shutdown: Arc<Notify>,
    /// Whether a `Connected` notice is outstanding.
    connected: bool,
}

impl TransportWorker {
    /// Create a new worker.
    ///
    /// `events` carries inbound frames and connection notices to the
    /// orchestrator; `control` carries probe/reconnect requests back.
    pub fn new(
        config: TransportConfig,
        events: mpsc::Sender<WorkerEvent>,
        control: mpsc::Receiver<ControlRequest>,
    ) -> Self {
        Self {
            config,
            events,
            control,
            shutdown: Arc::new(Notify::new()),
            connected: false,
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the connection loop until shutdown.
    pub async fn run(mut self) {
        info!(
            addr = %self.config.server_addr,
            reconnect_delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "Transport worker started"
        );

        loop {
            match self.wait_for_redial().await {
                Next::Stop => break,
                Next::Redial => {}
            }

            let stream = match TcpStream::connect(self.config.server_addr).await {
                Ok(stream) => stream,
                Err(e) if is_expected_outage(&e) => {
                    debug!(error = %e, "control-plane not reachable, will retry");
                    continue;
                }
                Err(e) => {
                    let notice = format!("dial failed: {e}");
                    if self.emit(WorkerEvent::Diagnostic(notice)).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            match self.serve(stream).await {
                Next::Stop => break,
                Next::Redial => {}
            }
        }

        info!("Transport worker stopped");
    }

    /// Sit out the constant retry delay.
    ///
    /// A `Reconnect` request cancels the timer; probes while disconnected
    /// are dropped.
    async fn wait_for_redial(&mut self) -> Next {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => return Next::Stop,

                req = self.control.recv() => match req {
                    Some(ControlRequest::Reconnect) => return Next::Redial,
                    Some(ControlRequest::Probe) => {
                        debug!("dropping probe, not connected");
                    }
                    None => return Next::Stop,
                },

                _ = tokio::time::sleep(self.config.reconnect_delay) => return Next::Redial,
            }
        }
    }

    /// Serve one established connection until it drops.
    async fn serve(&mut self, stream: TcpStream) -> Next {
        let (mut read_half, mut write_half) = stream.into_split();

        // Authenticate first; a failed write means the connection already
        // died under us and counts as a failed dial.
        let auth = match Frame::auth(&self.config.token) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "api token cannot be framed");
                return Next::Stop;
            }
        };
        if let Err(e) = write_frame(&mut write_half, &auth).await {
            debug!(error = %e, "connection lost before auth");
            return Next::Redial;
        }

        if !self.connected {
            self.connected = true;
            info!(addr = %self.config.server_addr, "connected to control-plane");
            if self.emit(WorkerEvent::Connected).await.is_err() {
                return Next::Stop;
            }
        }

        // Reads run in their own task so that cancelling a select branch
        // can never drop a partially read frame.
        let (frame_tx, mut frame_rx) = mpsc::channel::<Result<Frame, FrameError>>(32);
        let reader = tokio::spawn(async move {
            loop {
                let item = read_frame(&mut read_half).await;
                let done = item.is_err();
                if frame_tx.send(item).await.is_err() || done {
                    break;
                }
            }
        });

        let next = loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => break Next::Stop,

                req = self.control.recv() => match req {
                    Some(ControlRequest::Probe) => {
                        if let Err(e) = write_frame(&mut write_half, &Frame::ping()).await {
                            // The read side will surface the close.
                            debug!(error = %e, "probe write failed");
                        }
                    }
                    Some(ControlRequest::Reconnect) => break Next::Redial,
                    None => break Next::Stop,
                },

                item = frame_rx.recv() => match item {
                    Some(Ok(frame)) => {
                        if self.handle_frame(frame, &mut write_half).await.is_err() {
                            break Next::Stop;
                        }
                    }
                    Some(Err(FrameError::ConnectionClosed)) => {
                        debug!("control-plane closed the connection");
                        break Next::Redial;
                    }
                    Some(Err(e)) => {
                        let notice = format!("transport error: {e}");
                        if self.emit(WorkerEvent::Diagnostic(notice)).await.is_err() {
                            break Next::Stop;
                        }
                        break Next::Redial;
                    }
                    None => break Next::Redial,
                },
            }
        };

        reader.abort();

        if self.connected {
            self.connected = false;
            warn!(addr = %self.config.server_addr, "disconnected from control-plane");
            if self.emit(WorkerEvent::Disconnected).await.is_err() {
                return Next::Stop;
            }
        }

        next
    }

    /// Forward one inbound frame. Transport-level control frames are
    /// answered here and never exposed as application data.
    async fn handle_frame(
        &self,
        frame: Frame,
        write_half: &mut tokio::net::tcp::OwnedWriteHalf,
    ) -> Result<(), ()> {
        match frame.frame_type {
            FrameType::Text => match frame.as_text() {
                Ok(text) => self.emit(WorkerEvent::Text(text.to_string())).await,
                Err(e) => {
                    self.emit(WorkerEvent::Diagnostic(format!("bad frame payload: {e}")))
                        .await
                }
            },
            FrameType::Ping => {
                if let Err(e) = write_frame(write_half, &Frame::pong()).await {
                    debug!(error = %e, "pong write failed");
                }
                Ok(())
            }
            FrameType::Pong => {
                debug!("control-plane answered liveness probe");
                Ok(())
            }
            FrameType::Auth => {
                debug!("ignoring unexpected auth frame from control-plane");
                Ok(())
            }
        }
    }

    /// Send an event to the orchestrator. Err means the orchestrator is
    /// gone and the worker should stop.
    async fn emit(&self, event: WorkerEvent) -> Result<(), ()> {
        self.events.send(event).await.map_err(|_| ())
    }
}

/// Expected outage noise during control-plane restarts.
fn is_expected_outage(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_outage_classification() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");

        assert!(is_expected_outage(&refused));
        assert!(is_expected_outage(&reset));
        assert!(!is_expected_outage(&denied));
    }

    #[test]
    fn test_worker_starts_disconnected() {
        let (events, _events_rx) = mpsc::channel(8);
        let (_control_tx, control) = mpsc::channel(8);
        let worker = TransportWorker::new(
            TransportConfig {
                server_addr: "127.0.0.1:8007".parse().unwrap(),
                token: "t".to_string(),
                reconnect_delay: Duration::from_millis(100),
            },
            events,
            control,
        );
        assert!(!worker.connected);
    }
}
