// Player domain types: fantasy positions, stored player records, and the
// loosely-typed comparison-request shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fantasy-relevant NFL positions. Players at any other position are
/// filtered out during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    #[serde(rename = "DEF")]
    Def,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::Def,
    ];

    /// Parse a position string, case-insensitively.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            "K" => Some(Position::K),
            "DEF" => Some(Position::Def),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::Def => "DEF",
        }
    }
}

/// One player row in the store. Mirrors the fields served to clients by
/// the players endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub search_full_name: String,
    pub team: String,
    pub position: Position,
    pub injury_status: Option<String>,
    pub status: Option<String>,
}

/// One entry of a comparison request. Callers typically forward stored
/// player rows plus ranking metadata from their own draft tool, so every
/// field is optional and the numeric ones arrive in whatever type the
/// caller had on hand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparePlayer {
    #[serde(default)]
    pub search_full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub injury_status: Option<String>,
    #[serde(default)]
    pub depth_chart_order: Option<Value>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub search_rank: Option<Value>,
}

impl ComparePlayer {
    /// Display name: `search_full_name`, else "first last", else a fixed
    /// placeholder.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.search_full_name.as_deref() {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let combined = format!("{first} {last}").trim().to_string();
        if combined.is_empty() {
            "Unknown Player".to_string()
        } else {
            combined
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
