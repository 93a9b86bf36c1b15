// Ranking and selection of model-proposed keeper valuations.
//
// The generation model partitions candidates into keep/bench lists and
// estimates each player's market ADP, but its arithmetic is not trusted:
// every numeric field it claims is recomputed here from the validated
// candidate list before anything is returned to the caller. Proposals
// whose untrusted fields fail coercion are dropped individually; the
// request as a whole proceeds.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::league::{coerce_int, KeeperCandidate, LeagueSettings};
use crate::valuation::curve::CapitalCurve;
use crate::valuation::geometry::round_of;
use crate::valuation::span::span_value;

// ---------------------------------------------------------------------------
// Untrusted proposal types
// ---------------------------------------------------------------------------

/// The model's full structured reply. `recommendations` must be present
/// for the reply to count as well-formed; everything inside it is still
/// untrusted and coerced field by field.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelAdvice {
    #[serde(default)]
    pub assumptions: Value,
    pub recommendations: ModelRecommendations,
    #[serde(default)]
    pub summary: String,
}

/// The keep/bench partition proposed by the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelRecommendations {
    #[serde(default)]
    pub keep: Vec<RawProposal>,
    #[serde(default)]
    pub bench: Vec<RawProposal>,
}

/// One untrusted per-candidate proposal. All fields are raw JSON values;
/// the model routinely returns numbers as strings or echoes back wrong
/// keeper costs, so nothing here is used without coercion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProposal {
    #[serde(default)]
    pub player: Value,
    #[serde(default)]
    pub estimated_adp_overall: Value,
    #[serde(default)]
    pub risk_notes: Value,
    #[serde(default)]
    pub reasoning: Value,
}

// ---------------------------------------------------------------------------
// Authoritative valuation result
// ---------------------------------------------------------------------------

/// A fully recomputed keeper valuation. The numeric fields are derived
/// exclusively from the validated candidate and the model's ADP estimate;
/// the narrative fields pass through from the proposal.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct KeeperValuation {
    pub player: String,
    pub team: String,
    pub keep_round: u32,
    pub keep_pick: u32,
    pub keep_overall: u32,
    pub estimated_adp_overall: u32,
    /// Raw pick differential, keeper cost minus market ADP. Positive means
    /// the keeper cost is later (cheaper) than market.
    pub value_vs_adp: i64,
    /// Weight of the keeper cost's round on the capital curve.
    pub capital_weight: f64,
    /// Signed capital-weighted span value used for ranking.
    pub adjusted_value: f64,
    pub risk_notes: Vec<String>,
    pub reasoning: String,
}

/// The ranked output: keep truncated to the league's allowance, bench
/// unbounded, both sorted best-first.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RankedList {
    pub keep: Vec<KeeperValuation>,
    pub bench: Vec<KeeperValuation>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Score, sort, and truncate the model's proposals.
///
/// Pure in its inputs: re-running on the same league/candidates/proposals
/// always yields the same lists. Proposals naming unknown players or
/// carrying a non-coercible ADP are dropped.
pub fn evaluate<C: CapitalCurve + ?Sized>(
    league: &LeagueSettings,
    candidates: &[KeeperCandidate],
    proposals: &ModelRecommendations,
    curve: &C,
) -> RankedList {
    let by_name: HashMap<String, &KeeperCandidate> = candidates
        .iter()
        .map(|c| (c.name.to_lowercase(), c))
        .collect();

    let mut keep = score_proposals(&proposals.keep, &by_name, league, curve);
    let mut bench = score_proposals(&proposals.bench, &by_name, league, curve);

    sort_valuations(&mut keep);
    sort_valuations(&mut bench);
    keep.truncate(league.keepers_allowed as usize);

    RankedList { keep, bench }
}

fn score_proposals<C: CapitalCurve + ?Sized>(
    proposals: &[RawProposal],
    candidates: &HashMap<String, &KeeperCandidate>,
    league: &LeagueSettings,
    curve: &C,
) -> Vec<KeeperValuation> {
    proposals
        .iter()
        .filter_map(|raw| score_one(raw, candidates, league, curve))
        .collect()
}

fn score_one<C: CapitalCurve + ?Sized>(
    raw: &RawProposal,
    candidates: &HashMap<String, &KeeperCandidate>,
    league: &LeagueSettings,
    curve: &C,
) -> Option<KeeperValuation> {
    let name = raw.player.as_str()?.trim();
    let candidate = candidates.get(&name.to_lowercase())?;
    let adp = coerce_int(&raw.estimated_adp_overall)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|&n| n >= 1)?;

    let value_vs_adp = i64::from(candidate.keep_overall) - i64::from(adp);
    let adjusted_value = span_value(candidate.keep_overall, adp, league.teams, curve);
    let capital_weight = curve.weight(round_of(candidate.keep_overall, league.teams));

    Some(KeeperValuation {
        player: candidate.name.clone(),
        team: candidate.team.clone(),
        keep_round: candidate.keep_round,
        keep_pick: candidate.keep_pick,
        keep_overall: candidate.keep_overall,
        estimated_adp_overall: adp,
        value_vs_adp,
        capital_weight,
        adjusted_value,
        risk_notes: string_list(&raw.risk_notes),
        reasoning: raw.reasoning.as_str().unwrap_or("").to_string(),
    })
}

/// Best value first; ties go to the player the market prices earlier.
fn sort_valuations(list: &mut [KeeperValuation]) {
    list.sort_by(|a, b| {
        b.adjusted_value
            .partial_cmp(&a.adjusted_value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.estimated_adp_overall.cmp(&b.estimated_adp_overall))
    });
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
