// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Legacy demo repair engine.
//!
//! Old Portal 2 engine builds wrote a `DT_PointSurvey` structural table
//! into demo recordings. Modern builds replaced it with a second
//! `CPointCamera` server class, and demos still carrying the survey table
//! fail to play back. This crate inspects a parsed demo, decides whether
//! the known rewrite applies, and performs it in place:
//!
//! ```text
//!   demo ──> repair() ──> NotApplicable | ParseFailure | AlreadyFixed
//!                       | Unfixable(reason) | NotRequired
//!                       | Repaired(bytes)
//! ```
//!
//! Parsing and serialization of the on-disk format are external
//! capabilities; the engine only mutates the object graph and asks a
//! [`DemoSerializer`] for the output bytes.

#![deny(missing_docs)]

pub mod engine;
pub mod model;

pub use engine::{
    DENY_LISTED_MAPS, DemoSerializer, LEGACY_SURVEY_TABLE, MODERN_CAMERA_CLASS,
    MODERN_CAMERA_TABLE, RepairError, RepairOutcome, SUPPORTED_GAMES, SerializeError,
    UnfixableReason, repair,
};
pub use model::{DataTables, Demo, DemoHeader, SendTable, ServerClass};
