// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Renderline Protocol - framed text communication layer
//!
//! This crate provides the wire protocol for the link between the render
//! control-plane and the request front-end:
//! - Length-prefixed frames carrying UTF-8 text ([`frame`])
//! - The status-frame data model exchanged over those frames ([`message`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  renderline-protocol                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Messages: tagged JSON status frames (upload/error/config)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Framing: 4-byte length + 2-byte type + UTF-8 payload       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Frame types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `Auth` | Bearer token, sent once by the worker right after connect |
//! | `Text` | Application payload: a JSON status object or a diagnostic line |
//! | `Ping` / `Pong` | Transport-level liveness, never surfaced as application data |
//!
//! Application `Text` payloads are classified with [`message::classify`]:
//! JSON objects become [`message::StatusFrame`]s, anything else is treated as
//! a plain diagnostic log line from the control-plane.

pub mod frame;
pub mod message;

pub use frame::{Frame, FrameError, FrameType, FramedStream, read_frame, write_frame};
pub use message::{ConfigData, ErrorData, InboundText, StatusFrame, UploadData, classify};
