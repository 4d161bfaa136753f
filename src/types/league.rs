use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-operator record persisted to the league table store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub name: String,
    pub total: u64,
    pub on_time: u64,
    pub late: i64,
    pub cancelled_or_very_late: u64,
    pub percentage: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeagueTableEntry {
    pub name: String,
    pub percentage: f64,
}

/// What subscribers of the operators domain receive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    #[serde(rename = "currentData")]
    pub current_data: BTreeMap<String, OperatorRecord>,
    /// Highest percentage first.
    #[serde(rename = "leagueTable")]
    pub league_table: Vec<LeagueTableEntry>,
}
