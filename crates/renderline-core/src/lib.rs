// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Renderline Core - render-job coordination
//!
//! This crate is the request-front-end half of the render pipeline: it keeps
//! a persistent link to the control-plane, remembers who asked for each job,
//! and relays every terminal job outcome back to the original requester.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Control-plane                          │
//! │            (render queue, workers, video storage)            │
//! └──────────────────────────────────────────────────────────────┘
//!                │ framed text link (renderline-protocol)
//!                ▼
//! ┌───────────────────────┐   WorkerEvent    ┌───────────────────┐
//! │   TransportWorker     │─────────────────▶│     JobRelay      │
//! │  (dial, auth, retry)  │◀─────────────────│  (classify/route) │
//! └───────────────────────┘  ControlRequest  └───────────────────┘
//!                                               │           │
//!                                    take(share_id)      Notifier
//!                                               ▼           ▼
//!                                  ┌──────────────────┐  ┌─────────────┐
//!                                  │ CorrelationCache │  │  Chat SDK   │
//!                                  │  (+ sweeper)     │  │ (external)  │
//!                                  └──────────────────┘  └─────────────┘
//! ```
//!
//! # Delivery paths
//!
//! | Cache lookup | Delivery |
//! |--------------|----------|
//! | hit | edit the original acknowledgement via the cached handle |
//! | miss, origin channel known | post a fresh message into that channel |
//! | miss, no origin channel | post a direct message to the requester |
//!
//! Exactly one user-visible message is produced per terminal frame either
//! way. Delivery is fire-and-forget: a failed post is logged and never
//! retried, because the control-plane does not re-send terminal frames.
//!
//! # Modules
//!
//! - [`config`]: Configuration from environment variables
//! - [`correlation`]: Job-id to request-handle cache with periodic sweep
//! - [`limits`]: Admission limits pushed by the control-plane
//! - [`transport`]: Persistent auto-reconnecting control-plane link
//! - [`relay`]: Frame classification and delivery routing

#![deny(missing_docs)]

/// Configuration loaded from environment variables.
pub mod config;

/// Correlation cache mapping job ids back to request handles.
pub mod correlation;

/// Admission limits pushed by the control-plane.
pub mod limits;

/// Transport worker owning the control-plane connection.
pub mod transport;

/// Job relay orchestrator routing terminal frames to requesters.
pub mod relay;
