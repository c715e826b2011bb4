// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Status-frame data model for the control-plane link.
//!
//! The control-plane emits one JSON object per text frame:
//!
//! ```json
//! { "type": "upload" | "error" | "config", "data": { ... } }
//! ```
//!
//! `upload` and `error` are the two terminal signals of a render job;
//! `config` pushes the current admission limits. Text payloads that are not
//! JSON objects are plain diagnostic log lines, not application data.

use serde::{Deserialize, Serialize};

/// A status frame received from the control-plane.
///
/// Closed sum type so that an unrecognized frame kind is a deserialization
/// error rather than a silently ignored string tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StatusFrame {
    /// A render job finished and its video was uploaded.
    Upload(UploadData),
    /// A render job left the lifecycle with an error.
    Error(ErrorData),
    /// Configuration push (last-write-wins).
    Config(ConfigData),
}

/// Payload of an `upload` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadData {
    /// Job identifier; primary key for correlation.
    pub share_id: String,
    /// Human-readable title of the rendered video.
    pub title: String,
    /// User who requested the render.
    pub requested_by_id: String,
    /// Guild the request originated in, if any (fallback addressing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_in_guild_id: Option<String>,
    /// Channel the request originated in, if any (fallback addressing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_in_channel_id: Option<String>,
}

/// Payload of an `error` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    /// Status code reported by the control-plane.
    pub status: u32,
    /// Short human-readable reason, safe to show to the requester.
    pub message: String,
    /// Job identifier; primary key for correlation.
    pub share_id: String,
    /// User who requested the render.
    pub requested_by_id: String,
    /// Guild the request originated in, if any (fallback addressing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_in_guild_id: Option<String>,
    /// Channel the request originated in, if any (fallback addressing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_in_channel_id: Option<String>,
}

/// Payload of a `config` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigData {
    /// Maximum accepted demo file size in bytes.
    #[serde(rename = "maxDemoFileSize")]
    pub max_demo_file_size: u64,
}

/// Classification of an inbound text payload.
#[derive(Debug)]
pub enum InboundText {
    /// A recognized status frame.
    Status(StatusFrame),
    /// A plain diagnostic log line from the control-plane.
    Diagnostic(String),
    /// A JSON object that is not a recognized status frame.
    /// Logged and dropped; the control-plane never re-sends frames.
    Malformed {
        /// The raw payload, for internal diagnostics only.
        raw: String,
        /// What the parser objected to.
        error: serde_json::Error,
    },
}

/// Classify an inbound text payload.
///
/// Anything that does not look like a JSON object is a diagnostic log line;
/// a JSON object that fails to parse as a [`StatusFrame`] is a protocol
/// error surfaced as [`InboundText::Malformed`].
pub fn classify(payload: &str) -> InboundText {
    if !payload.trim_start().starts_with('{') {
        return InboundText::Diagnostic(payload.to_string());
    }
    match serde_json::from_str::<StatusFrame>(payload) {
        Ok(frame) => InboundText::Status(frame),
        Err(error) => InboundText::Malformed {
            raw: payload.to_string(),
            error,
        },
    }
}
