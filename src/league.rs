// League settings and keeper-candidate validation.
//
// Both arrive as caller-supplied JSON. A malformed league or candidate
// rejects the whole request with a descriptive message: partially
// evaluating a keeper list would silently mis-rank it.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::valuation::geometry::overall_of;

/// A caller-side validation failure, surfaced as a client error.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct RequestError(pub String);

// ---------------------------------------------------------------------------
// League settings
// ---------------------------------------------------------------------------

/// Validated league configuration for one evaluation request.
#[derive(Debug, Clone, Serialize)]
pub struct LeagueSettings {
    pub teams: u32,
    pub format: String,
    pub qb_slots: u32,
    pub your_slot: u32,
    pub keepers_allowed: u32,
}

impl LeagueSettings {
    /// Expected keeper count across the rest of the league, assuming every
    /// opponent keeps their full allowance.
    pub fn opponent_keepers(&self) -> u32 {
        self.keepers_allowed * self.teams.saturating_sub(1)
    }
}

/// Validate the `league` object of a keeper request.
///
/// `teams`, `your_slot`, and `keepers_allowed` are required integers;
/// `format` defaults to "PPR" and `qb_slots` to 1.
pub fn parse_league(league: Option<&Value>) -> Result<LeagueSettings, RequestError> {
    let league = match league {
        Some(Value::Object(map)) => map,
        _ => return Err(RequestError("league object is required".into())),
    };

    for key in ["teams", "your_slot", "keepers_allowed"] {
        if !league.contains_key(key) {
            return Err(RequestError(format!("league.{key} is required")));
        }
    }

    let (Some(teams), Some(keepers_allowed), Some(your_slot)) = (
        coerce_int(&league["teams"]),
        coerce_int(&league["keepers_allowed"]),
        coerce_int(&league["your_slot"]),
    ) else {
        return Err(RequestError(
            "league.teams, league.keepers_allowed, and league.your_slot must be integers.".into(),
        ));
    };

    if teams <= 0 || keepers_allowed < 0 || your_slot <= 0 || your_slot > teams {
        return Err(RequestError(
            "Invalid league values (teams > 0, 0<=keepers_allowed, 1<=your_slot<=teams).".into(),
        ));
    }

    let format = league
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or("PPR")
        .to_string();
    let qb_slots = league
        .get("qb_slots")
        .and_then(coerce_int)
        .filter(|&n| n > 0)
        .unwrap_or(1);

    Ok(LeagueSettings {
        teams: teams as u32,
        format,
        qb_slots: qb_slots as u32,
        your_slot: your_slot as u32,
        keepers_allowed: keepers_allowed as u32,
    })
}

// ---------------------------------------------------------------------------
// Keeper candidates
// ---------------------------------------------------------------------------

/// A validated keeper candidate. Constructed once per request and never
/// mutated afterwards; the keeper cost recorded here is authoritative over
/// anything the generation model later echoes back.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KeeperCandidate {
    pub name: String,
    pub team: String,
    pub keep_round: u32,
    pub keep_pick: u32,
    pub keep_overall: u32,
}

impl KeeperCandidate {
    /// "round.pick" display form, e.g. "3.07" style without zero padding.
    pub fn keep_str(&self) -> String {
        format!("{}.{}", self.keep_round, self.keep_pick)
    }
}

/// Validate the `players` array of a keeper request.
///
/// Each entry needs a name, `meta.round`, `meta.pick`, and
/// `keeper_overall`; `meta.team_abbr` is optional. The overall cost must
/// agree with `(round-1)*teams + pick`, since an inconsistent coordinate
/// means the caller's draft math is wrong and every downstream valuation
/// would inherit the error.
pub fn parse_candidates(
    players: Option<&Value>,
    teams: u32,
) -> Result<Vec<KeeperCandidate>, RequestError> {
    let players = match players {
        Some(Value::Array(list)) if !list.is_empty() => list,
        _ => {
            return Err(RequestError(
                "players array is required and must be non-empty.".into(),
            ))
        }
    };

    let mut candidates = Vec::with_capacity(players.len());
    for entry in players {
        let name = entry
            .get("player")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();
        let meta = entry.get("meta");
        let round = meta.and_then(|m| m.get("round")).and_then(coerce_int);
        let pick = meta.and_then(|m| m.get("pick")).and_then(coerce_int);
        let keep_overall = entry.get("keeper_overall").and_then(coerce_int);

        let (Some(round), Some(pick), Some(keep_overall)) = (round, pick, keep_overall) else {
            return Err(RequestError(
                "Each player needs: player (name), meta.round, meta.pick, keeper_overall.".into(),
            ));
        };
        if name.is_empty() {
            return Err(RequestError(
                "Each player needs: player (name), meta.round, meta.pick, keeper_overall.".into(),
            ));
        }

        if round < 1 || pick < 1 || pick > i64::from(teams) || keep_overall < 1 {
            return Err(RequestError(format!(
                "Invalid keeper cost for {name}: round and pick must be positive and pick <= teams."
            )));
        }

        let round = round as u32;
        let pick = pick as u32;
        let keep_overall = keep_overall as u32;
        if overall_of(round, pick, teams) != keep_overall {
            return Err(RequestError(format!(
                "Keeper cost for {name} is inconsistent: round {round} pick {pick} is overall {} in a {teams}-team league, not {keep_overall}.",
                overall_of(round, pick, teams)
            )));
        }

        let team = meta
            .and_then(|m| m.get("team_abbr"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        candidates.push(KeeperCandidate {
            name,
            team,
            keep_round: round,
            keep_pick: pick,
            keep_overall,
        });
    }

    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

/// Coerce a JSON value to an integer: integral numbers directly, finite
/// floats by rounding, numeric strings by parsing. Anything else is None.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
