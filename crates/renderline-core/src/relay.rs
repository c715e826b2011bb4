// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Job relay orchestrator.
//!
//! Consumes [`WorkerEvent`]s from the transport worker, classifies the
//! application frames, and routes each terminal frame to exactly one
//! delivery path: editing the original acknowledgement when a correlation
//! is live, or posting a fresh message using the fallback addressing
//! carried in the frame.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use renderline_protocol::message::{ErrorData, InboundText, StatusFrame, UploadData, classify};

use crate::correlation::CorrelationCache;
use crate::limits::AdmissionLimits;
use crate::transport::WorkerEvent;

/// A delivery attempt failed.
///
/// Failures are logged and never retried: the terminal event itself is not
/// re-deliverable, because the control-plane does not resend frames.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The chat platform rejected or dropped the message.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivery seam to the chat platform SDK.
///
/// The relay never talks to the chat platform directly; implementations
/// wrap whatever SDK the front-end uses.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Opaque capability allowing exactly one edit of the original
    /// acknowledgement message.
    type Handle: Send + 'static;

    /// Edit the original acknowledgement message.
    async fn edit_original(&self, handle: Self::Handle, content: &str) -> Result<(), NotifyError>;

    /// Post a fresh message into the channel the request originated in.
    async fn post_channel(
        &self,
        guild_id: Option<&str>,
        channel_id: &str,
        content: &str,
    ) -> Result<(), NotifyError>;

    /// Post a direct message to the requester.
    async fn post_direct(&self, user_id: &str, content: &str) -> Result<(), NotifyError>;
}

/// Orchestrator that routes terminal frames back to requesters.
pub struct JobRelay<N: Notifier> {
    cache: Arc<CorrelationCache<N::Handle>>,
    notifier: Arc<N>,
    limits: Arc<AdmissionLimits>,
    video_base_url: String,
    events: mpsc::Receiver<WorkerEvent>,
}

impl<N: Notifier> JobRelay<N> {
    /// Create a new relay.
    pub fn new(
        cache: Arc<CorrelationCache<N::Handle>>,
        notifier: Arc<N>,
        limits: Arc<AdmissionLimits>,
        video_base_url: impl Into<String>,
        events: mpsc::Receiver<WorkerEvent>,
    ) -> Self {
        Self {
            cache,
            notifier,
            limits,
            video_base_url: video_base_url.into(),
            events,
        }
    }

    /// Consume worker events until the transport worker goes away.
    pub async fn run(mut self) {
        info!("Job relay started");

        while let Some(event) = self.events.recv().await {
            match event {
                WorkerEvent::Connected => info!("control-plane link up"),
                WorkerEvent::Disconnected => warn!("control-plane link down"),
                WorkerEvent::Diagnostic(line) => {
                    debug!(line = %line, "transport diagnostic");
                }
                WorkerEvent::Text(payload) => self.handle_text(&payload).await,
            }
        }

        info!("Job relay stopped");
    }

    async fn handle_text(&self, payload: &str) {
        match classify(payload) {
            InboundText::Diagnostic(line) => {
                info!(line = %line, "control-plane log");
            }
            InboundText::Malformed { error, raw } => {
                // Frames are never re-sent; drop it. Raw contents stay in
                // the internal log, never in user-visible output.
                warn!(error = %error, raw = %raw, "dropping unrecognized frame");
            }
            InboundText::Status(StatusFrame::Config(config)) => {
                self.limits.set_max_demo_file_size(config.max_demo_file_size);
                info!(
                    max_demo_file_size = config.max_demo_file_size,
                    "admission limits updated"
                );
            }
            InboundText::Status(StatusFrame::Upload(data)) => {
                let content = self.success_content(&data);
                self.deliver(
                    &data.share_id,
                    &content,
                    &data.requested_by_id,
                    data.requested_in_guild_id.as_deref(),
                    data.requested_in_channel_id.as_deref(),
                )
                .await;
            }
            InboundText::Status(StatusFrame::Error(data)) => {
                let content = self.failure_content(&data);
                self.deliver(
                    &data.share_id,
                    &content,
                    &data.requested_by_id,
                    data.requested_in_guild_id.as_deref(),
                    data.requested_in_channel_id.as_deref(),
                )
                .await;
            }
        }
    }

    /// Produce exactly one user-visible message for a terminal frame.
    async fn deliver(
        &self,
        share_id: &str,
        content: &str,
        requested_by_id: &str,
        guild_id: Option<&str>,
        channel_id: Option<&str>,
    ) {
        let result = match self.cache.take(share_id) {
            Some(entry) => {
                debug!(share_id = %share_id, "editing original acknowledgement");
                self.notifier.edit_original(entry.handle, content).await
            }
            None => match channel_id {
                Some(channel_id) => {
                    debug!(share_id = %share_id, channel_id = %channel_id, "posting into origin channel");
                    self.notifier
                        .post_channel(guild_id, channel_id, content)
                        .await
                }
                None => {
                    debug!(share_id = %share_id, user_id = %requested_by_id, "posting direct message");
                    self.notifier.post_direct(requested_by_id, content).await
                }
            },
        };

        if let Err(e) = result {
            warn!(share_id = %share_id, error = %e, "failed to deliver render notice");
        }
    }

    fn success_content(&self, data: &UploadData) -> String {
        format!(
            "Finished rendering \"{}\": {}/{}",
            data.title,
            self.video_base_url.trim_end_matches('/'),
            data.share_id
        )
    }

    fn failure_content(&self, data: &ErrorData) -> String {
        format!(
            "Rendering of {} failed (status {}): {}",
            data.share_id, data.status, data.message
        )
    }
}
