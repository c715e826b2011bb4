// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Repair decision procedure and in-place rewrite.

use thiserror::Error;
use tracing::{debug, info};

use crate::model::Demo;

/// Server class name used by modern engine builds for cameras.
pub const MODERN_CAMERA_CLASS: &str = "CPointCamera";
/// Net-table name owned by the modern camera class.
pub const MODERN_CAMERA_TABLE: &str = "DT_PointCamera";
/// Net-table name of the legacy survey table.
pub const LEGACY_SURVEY_TABLE: &str = "DT_PointSurvey";

/// Game titles the repair is defined for.
pub const SUPPORTED_GAMES: [&str; 3] = ["portal2", "aperturetag", "portal_stories"];

/// Maps on which the repair is always refused.
///
/// These maps legitimately use the survey feature, and a widely used
/// third-party repair tool corrupts exactly these maps. The two causes
/// cannot be told apart at this representational level, so both collapse
/// into one refusal.
pub const DENY_LISTED_MAPS: [&str; 4] = ["sp_a2_bts2", "sp_a2_bts3", "sp_a2_core", "sp_a3_00"];

/// Why a demo cannot be repaired automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnfixableReason {
    /// The map is on the fixed deny-list.
    #[error("map {0} is known to break under the automatic fix")]
    DenyListedMap(String),
}

/// Serialization of the mutated demo failed.
#[derive(Debug, Error)]
#[error("demo serialization failed: {0}")]
pub struct SerializeError(pub String);

/// Errors that escape the decision procedure.
///
/// Everything the procedure can decide about the demo itself is an
/// [`RepairOutcome`]; only the external serialization capability can fail.
#[derive(Debug, Error)]
pub enum RepairError {
    /// The serializer could not produce output bytes.
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// Result of running the repair engine over one demo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The game title is not one the repair is defined for.
    NotApplicable,
    /// The demo lacks the structure the procedure needs to decide.
    ParseFailure,
    /// The demo is already in modern form.
    AlreadyFixed,
    /// The repair is refused for this demo.
    Unfixable(UnfixableReason),
    /// The demo was recorded on a version that never needed the fix.
    NotRequired,
    /// The repair was applied; the payload is the re-serialized demo.
    Repaired(Vec<u8>),
}

/// Serialization seam for the on-disk demo format.
///
/// The engine prepares the mutated object graph; producing bytes is the
/// parser library's job.
pub trait DemoSerializer {
    /// Serialize `demo`, preallocating roughly `size_hint` bytes.
    fn save(&self, demo: &Demo, size_hint: usize) -> Result<Vec<u8>, SerializeError>;
}

/// Decide whether `demo` carries the legacy survey table and, when safe,
/// rewrite it to modern form in place.
///
/// The decision procedure is evaluated in order, first match wins. `demo`
/// is only mutated on the [`RepairOutcome::Repaired`] path; every other
/// outcome leaves it untouched.
pub fn repair(
    demo: &mut Demo,
    serializer: &dyn DemoSerializer,
) -> Result<RepairOutcome, RepairError> {
    let game = demo.header.game_directory.to_ascii_lowercase();
    if !SUPPORTED_GAMES.contains(&game.as_str()) {
        debug!(game = %demo.header.game_directory, "repair not defined for this title");
        return Ok(RepairOutcome::NotApplicable);
    }

    let deny_listed = DENY_LISTED_MAPS.contains(&demo.header.map_name.as_str());

    let Some(data_tables) = demo.data_tables.as_mut() else {
        debug!(map = %demo.header.map_name, "demo has no structural-table message");
        return Ok(RepairOutcome::ParseFailure);
    };

    let camera_classes = data_tables
        .server_classes
        .iter()
        .filter(|class| class.class_name == MODERN_CAMERA_CLASS)
        .count();
    if camera_classes == 2 {
        return Ok(if deny_listed {
            RepairOutcome::Unfixable(UnfixableReason::DenyListedMap(demo.header.map_name.clone()))
        } else {
            RepairOutcome::AlreadyFixed
        });
    }

    let Some(survey_index) = data_tables
        .tables
        .iter()
        .position(|table| table.net_table_name == LEGACY_SURVEY_TABLE)
    else {
        return Ok(RepairOutcome::NotRequired);
    };

    if deny_listed {
        return Ok(RepairOutcome::Unfixable(UnfixableReason::DenyListedMap(
            demo.header.map_name.clone(),
        )));
    }

    // Find the owning class before mutating anything, so a malformed demo
    // is left untouched.
    let Some(owner_index) = data_tables
        .server_classes
        .iter()
        .position(|class| class.data_table_name == LEGACY_SURVEY_TABLE)
    else {
        debug!(map = %demo.header.map_name, "survey table has no owning server class");
        return Ok(RepairOutcome::ParseFailure);
    };

    data_tables.tables.remove(survey_index);
    let owner = &mut data_tables.server_classes[owner_index];
    owner.class_name = MODERN_CAMERA_CLASS.to_string();
    owner.data_table_name = MODERN_CAMERA_TABLE.to_string();

    info!(
        map = %demo.header.map_name,
        survey_index = survey_index,
        "rewrote legacy survey table to modern camera class"
    );

    let bytes = serializer.save(demo, demo.header.byte_len as usize)?;
    Ok(RepairOutcome::Repaired(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DataTables, DemoHeader, SendTable, ServerClass};

    struct NoopSerializer;

    impl DemoSerializer for NoopSerializer {
        fn save(&self, _demo: &Demo, size_hint: usize) -> Result<Vec<u8>, SerializeError> {
            Ok(vec![0u8; size_hint.min(8)])
        }
    }

    fn demo(game: &str, map: &str, data_tables: Option<DataTables>) -> Demo {
        Demo {
            header: DemoHeader {
                game_directory: game.to_string(),
                map_name: map.to_string(),
                byte_len: 1024,
            },
            data_tables,
        }
    }

    fn modern_tables() -> DataTables {
        DataTables {
            tables: vec![SendTable {
                name: "DT_PointCamera".to_string(),
                net_table_name: "DT_PointCamera".to_string(),
            }],
            server_classes: vec![
                ServerClass {
                    class_name: "CPointCamera".to_string(),
                    data_table_name: "DT_PointCamera".to_string(),
                },
                ServerClass {
                    class_name: "CPointCamera".to_string(),
                    data_table_name: "DT_PointCamera".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_unsupported_title_is_not_applicable() {
        let mut demo = demo("csgo", "de_dust2", Some(modern_tables()));
        let outcome = repair(&mut demo, &NoopSerializer).unwrap();
        assert_eq!(outcome, RepairOutcome::NotApplicable);
    }

    #[test]
    fn test_title_match_is_case_insensitive() {
        let mut demo = demo("Portal2", "sp_a1_intro", Some(modern_tables()));
        let outcome = repair(&mut demo, &NoopSerializer).unwrap();
        assert_eq!(outcome, RepairOutcome::AlreadyFixed);
    }

    #[test]
    fn test_missing_data_tables_is_parse_failure() {
        let mut demo = demo("portal2", "sp_a1_intro", None);
        let outcome = repair(&mut demo, &NoopSerializer).unwrap();
        assert_eq!(outcome, RepairOutcome::ParseFailure);
    }

    #[test]
    fn test_survey_table_without_owner_is_parse_failure() {
        let mut demo = demo(
            "portal2",
            "sp_a1_intro",
            Some(DataTables {
                tables: vec![SendTable {
                    name: "DT_PointSurvey".to_string(),
                    net_table_name: "DT_PointSurvey".to_string(),
                }],
                server_classes: vec![],
            }),
        );
        let before = demo.clone();

        let outcome = repair(&mut demo, &NoopSerializer).unwrap();
        assert_eq!(outcome, RepairOutcome::ParseFailure);
        // No mutation on the failure path
        assert_eq!(demo, before);
    }

    #[test]
    fn test_no_survey_table_is_not_required() {
        let mut demo = demo(
            "portal2",
            "sp_a1_intro",
            Some(DataTables {
                tables: vec![],
                server_classes: vec![ServerClass {
                    class_name: "CPointCamera".to_string(),
                    data_table_name: "DT_PointCamera".to_string(),
                }],
            }),
        );
        let outcome = repair(&mut demo, &NoopSerializer).unwrap();
        assert_eq!(outcome, RepairOutcome::NotRequired);
    }
}
