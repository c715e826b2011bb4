// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Integration tests for the transport worker against a real TCP listener.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use renderline_core::transport::{ControlRequest, TransportConfig, TransportWorker, WorkerEvent};
use renderline_protocol::frame::{Frame, FrameType, read_frame, write_frame};

const TOKEN: &str = "test-token-1234";

struct Harness {
    listener: TcpListener,
    events: mpsc::Receiver<WorkerEvent>,
    control: mpsc::Sender<ControlRequest>,
    shutdown: std::sync::Arc<tokio::sync::Notify>,
    worker: tokio::task::JoinHandle<()>,
}

impl Harness {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (events_tx, events) = mpsc::channel(32);
        let (control, control_rx) = mpsc::channel(8);
        let worker = TransportWorker::new(
            TransportConfig {
                server_addr: addr,
                token: TOKEN.to_string(),
                reconnect_delay: Duration::from_millis(50),
            },
            events_tx,
            control_rx,
        );
        let shutdown = worker.shutdown_handle();
        let worker = tokio::spawn(worker.run());

        Self {
            listener,
            events,
            control,
            shutdown,
            worker,
        }
    }

    /// Accept the next dial and consume the auth frame.
    async fn accept_authed(&self) -> TcpStream {
        let (mut stream, _) = tokio::time::timeout(Duration::from_secs(2), self.listener.accept())
            .await
            .expect("worker should dial")
            .unwrap();
        let auth = tokio::time::timeout(Duration::from_secs(2), read_frame(&mut stream))
            .await
            .expect("auth frame should arrive")
            .unwrap();
        assert_eq!(auth.frame_type, FrameType::Auth);
        assert_eq!(auth.as_text().unwrap(), TOKEN);
        stream
    }

    async fn next_event(&mut self) -> WorkerEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("event should arrive")
            .expect("worker should be alive")
    }

    async fn stop(self) {
        self.shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(2), self.worker)
            .await
            .expect("worker should stop after shutdown")
            .unwrap();
    }
}

#[tokio::test]
async fn worker_authenticates_and_forwards_text() {
    let mut harness = Harness::start().await;

    let mut stream = harness.accept_authed().await;
    assert_eq!(harness.next_event().await, WorkerEvent::Connected);

    let frame = Frame::text(r#"{"type":"config","data":{"maxDemoFileSize":1}}"#).unwrap();
    write_frame(&mut stream, &frame).await.unwrap();

    match harness.next_event().await {
        WorkerEvent::Text(payload) => assert!(payload.contains("maxDemoFileSize")),
        other => panic!("expected text event, got {:?}", other),
    }

    harness.stop().await;
}

#[tokio::test]
async fn worker_reconnects_with_single_notice_pair() {
    let mut harness = Harness::start().await;

    let stream = harness.accept_authed().await;
    assert_eq!(harness.next_event().await, WorkerEvent::Connected);

    // Server drops the connection; worker must notice and redial.
    drop(stream);
    assert_eq!(harness.next_event().await, WorkerEvent::Disconnected);

    let _stream = harness.accept_authed().await;
    assert_eq!(harness.next_event().await, WorkerEvent::Connected);

    // Exactly one notice per transition, nothing queued behind it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(harness.events.try_recv().is_err());

    harness.stop().await;
}

#[tokio::test]
async fn worker_answers_server_ping() {
    let mut harness = Harness::start().await;

    let mut stream = harness.accept_authed().await;
    assert_eq!(harness.next_event().await, WorkerEvent::Connected);

    write_frame(&mut stream, &Frame::ping()).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(2), read_frame(&mut stream))
        .await
        .expect("pong should arrive")
        .unwrap();
    assert_eq!(reply.frame_type, FrameType::Pong);

    harness.stop().await;
}

#[tokio::test]
async fn probe_request_sends_ping_when_connected() {
    let mut harness = Harness::start().await;

    let mut stream = harness.accept_authed().await;
    assert_eq!(harness.next_event().await, WorkerEvent::Connected);

    harness.control.send(ControlRequest::Probe).await.unwrap();
    let probe = tokio::time::timeout(Duration::from_secs(2), read_frame(&mut stream))
        .await
        .expect("ping should arrive")
        .unwrap();
    assert_eq!(probe.frame_type, FrameType::Ping);

    harness.stop().await;
}

#[tokio::test]
async fn reconnect_request_redials_immediately() {
    let mut harness = Harness::start().await;

    let _stream = harness.accept_authed().await;
    assert_eq!(harness.next_event().await, WorkerEvent::Connected);

    harness
        .control
        .send(ControlRequest::Reconnect)
        .await
        .unwrap();

    // The old connection is abandoned and a new dial comes in.
    assert_eq!(harness.next_event().await, WorkerEvent::Disconnected);
    let _stream = harness.accept_authed().await;
    assert_eq!(harness.next_event().await, WorkerEvent::Connected);

    harness.stop().await;
}

#[tokio::test]
async fn refused_dials_stay_silent() {
    // Grab a port that nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (events_tx, mut events) = mpsc::channel(32);
    let (_control_tx, control_rx) = mpsc::channel(8);
    let worker = TransportWorker::new(
        TransportConfig {
            server_addr: addr,
            token: TOKEN.to_string(),
            reconnect_delay: Duration::from_millis(20),
        },
        events_tx,
        control_rx,
    );
    let shutdown = worker.shutdown_handle();
    let worker = tokio::spawn(worker.run());

    // Several refused dial attempts happen in this window.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(events.try_recv().is_err());

    shutdown.notify_one();
    tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("worker should stop after shutdown")
        .unwrap();
}
