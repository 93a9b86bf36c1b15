// Request orchestration for the two AI-backed endpoints.
//
// Validates caller input, hands a prompt to the chat model, and grounds
// the reply: the keeper flow re-derives every numeric field through the
// valuation engine before responding, and any model-side failure surfaces
// as a generic server error rather than leaking upstream detail.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LlmSettings;
use crate::league::{coerce_int, parse_candidates, parse_league};
use crate::llm::client::{ChatModel, ChatRequest};
use crate::llm::prompt;
use crate::players::ComparePlayer;
use crate::valuation::curve::DraftCapitalCurve;
use crate::valuation::rank::{evaluate, ModelAdvice};

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Failures surfaced to HTTP clients. Client errors carry the validation
/// message; generation errors display a fixed public message and keep the
/// underlying cause for the server log only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Generation {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::BadRequest(_))
    }
}

const KEEPER_FAILURE: &str = "Failed to generate recommendations.";
const COMPARE_FAILURE: &str = "Failed to generate a comparison.";

// ---------------------------------------------------------------------------
// Keeper recommendations
// ---------------------------------------------------------------------------

/// Evaluate a keeper request end to end: validate, ask the model for its
/// keep/bench partition and ADP estimates, then recompute and re-rank the
/// numbers locally.
pub async fn recommend_keepers(
    model: &dyn ChatModel,
    llm: &LlmSettings,
    body: &Value,
) -> Result<Value, ApiError> {
    let league = parse_league(body.get("league")).map_err(|e| ApiError::BadRequest(e.0))?;
    let candidates = parse_candidates(body.get("players"), league.teams)
        .map_err(|e| ApiError::BadRequest(e.0))?;
    let opponent_keepers = league.opponent_keepers();

    info!(
        teams = league.teams,
        candidates = candidates.len(),
        keepers_allowed = league.keepers_allowed,
        "evaluating keeper request"
    );

    let reply = model
        .complete(ChatRequest {
            system: prompt::keeper_system_prompt(),
            user: prompt::build_keeper_prompt(&league, opponent_keepers, &candidates),
            temperature: llm.keeper_temperature,
            max_tokens: llm.max_tokens,
            json_response: true,
        })
        .await
        .map_err(|source| ApiError::Generation {
            message: KEEPER_FAILURE,
            source,
        })?;

    let advice: ModelAdvice = serde_json::from_str(&reply).map_err(|e| {
        warn!("model reply was not parseable keeper advice: {e}");
        ApiError::Generation {
            message: KEEPER_FAILURE,
            source: anyhow::Error::new(e),
        }
    })?;

    let ranked = evaluate(&league, &candidates, &advice.recommendations, &DraftCapitalCurve);
    info!(
        kept = ranked.keep.len(),
        benched = ranked.bench.len(),
        "keeper ranking complete"
    );

    // The model's own assumptions pass through, but the opponent-keeper
    // count falls back to the computed hint if the model mangled it.
    let opponent = advice
        .assumptions
        .get("opponent_keepers")
        .and_then(coerce_int)
        .filter(|&n| n >= 0)
        .map(|n| n as u64)
        .unwrap_or(u64::from(opponent_keepers));
    let notes = advice
        .assumptions
        .get("notes")
        .and_then(Value::as_str)
        .unwrap_or("");

    Ok(json!({
        "assumptions": { "opponent_keepers": opponent, "notes": notes },
        "recommendations": { "keep": ranked.keep, "bench": ranked.bench },
        "summary": advice.summary,
    }))
}

// ---------------------------------------------------------------------------
// Player comparison
// ---------------------------------------------------------------------------

/// Ask the model to compare two or more players and recommend one.
pub async fn compare_players(
    model: &dyn ChatModel,
    llm: &LlmSettings,
    body: &Value,
) -> Result<Value, ApiError> {
    let players: Vec<ComparePlayer> = match body.get("players") {
        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone()).map_err(|_| {
            ApiError::BadRequest("players must be an array of player objects.".into())
        })?,
        _ => Vec::new(),
    };

    if players.len() < 2 {
        return Err(ApiError::BadRequest(
            "Provide at least two players to compare.".into(),
        ));
    }

    info!(players = players.len(), "comparing players");

    let reply = model
        .complete(ChatRequest {
            system: prompt::compare_system_prompt(),
            user: prompt::build_compare_prompt(&players),
            temperature: llm.compare_temperature,
            max_tokens: llm.max_tokens,
            json_response: false,
        })
        .await
        .map_err(|source| ApiError::Generation {
            message: COMPARE_FAILURE,
            source,
        })?;

    Ok(json!({ "recommendation": reply.trim() }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
