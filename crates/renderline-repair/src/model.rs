// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Object model of a parsed demo recording.
//!
//! Only the parts the repair engine touches are modeled. The external
//! parser owns the full format; everything it parses but the engine never
//! reads travels through untouched on its side of the seam.

use serde::{Deserialize, Serialize};

/// A parsed demo recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demo {
    /// Fixed-size header present in every demo.
    pub header: DemoHeader,
    /// The structural-table message, if the parser found one.
    pub data_tables: Option<DataTables>,
}

/// Header fields the repair engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoHeader {
    /// Game title the demo was recorded in, e.g. `portal2`.
    pub game_directory: String,
    /// Map the demo was recorded on, e.g. `sp_a1_intro`.
    pub map_name: String,
    /// Size of the original file in bytes, used as a serialization hint.
    pub byte_len: u64,
}

/// The structural-table message: network tables plus the server classes
/// that own them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTables {
    /// Ordered network table definitions.
    pub tables: Vec<SendTable>,
    /// Server class records, each naming the table it owns.
    pub server_classes: Vec<ServerClass>,
}

/// One network table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTable {
    /// Declared table name.
    pub name: String,
    /// Net-table name the engine matches on.
    pub net_table_name: String,
}

/// One server class record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerClass {
    /// Declared class name, e.g. `CPointCamera`.
    pub class_name: String,
    /// Net-table name of the table this class owns.
    pub data_table_name: String,
}
