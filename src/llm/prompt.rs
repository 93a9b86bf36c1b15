// Prompt templates for keeper evaluation and player comparison.
//
// Constructs compact, structured prompts for the chat model. The keeper
// prompt embeds the league context and candidate costs as minified JSON
// and pins the exact response schema, because the reply is parsed
// strictly; the comparison prompt is conversational.

use serde_json::json;

use crate::league::{KeeperCandidate, LeagueSettings};
use crate::players::ComparePlayer;

// ---------------------------------------------------------------------------
// Keeper evaluation
// ---------------------------------------------------------------------------

/// System prompt for the keeper evaluation call.
pub fn keeper_system_prompt() -> String {
    "You are a sharp, up-to-date fantasy football analyst. \
     You evaluate keeper values in PPR/Half-PPR/Standard 1QB or 2QB/Superflex formats. \
     Given a user's league settings and a list of potential keepers with their keeper costs, \
     pick the best keepers based on value versus current ADP and role outlook. \
     Incorporate the latest injuries/suspensions/roles you know about. \
     Very important: Higher overall picks are more valuable than lower ones; draft capital matters. \
     Assume other managers will also keep players (use the provided opponent_keepers hint). \
     If any injury/status/ADP detail is uncertain, state that assumption in 'assumptions'. \
     Return ONLY valid JSON that conforms to the requested schema. No extra text."
        .to_string()
}

/// The response schema pinned into every keeper prompt. The ranking code
/// recomputes all numeric fields, but spelling them out keeps the model's
/// keep/bench partition and ADP estimates in a parseable shape.
const KEEPER_SCHEMA: &str = r#"Return strict JSON with this shape:

{
  "assumptions": {
    "opponent_keepers": number,
    "notes": string
  },
  "recommendations": {
    "keep": [
      {
        "player": string,
        "team": string,
        "keep_round": number,
        "keep_pick": number,
        "keep_overall": number,
        "estimated_adp_overall": number,
        "value_vs_adp": number,
        "risk_notes": [string],
        "reasoning": string
      }
    ],
    "bench": [ ...same shape as keep entries... ]
  },
  "summary": string
}

Rules:
- "keep" must contain at most LEAGUE_KEEPERS_ALLOWED players, ranked best to worst.
- "estimated_adp_overall" is your best current estimate for overall ADP (state uncertainty if needed).
- Prefer keeping elite players at a discount even if the discount is small; adjust for positional/format (QB slots, PPR/Half/Std).
- Consider that OPPORTUNITY COST increases sharply in early rounds.
- Keep the reasoning concise and focused on value, role, team situation, and risk."#;

/// Build the user prompt for a keeper evaluation request.
pub fn build_keeper_prompt(
    league: &LeagueSettings,
    opponent_keepers: u32,
    candidates: &[KeeperCandidate],
) -> String {
    let league_summary = json!({
        "teams": league.teams,
        "format": league.format,
        "qb_slots": league.qb_slots,
        "your_slot": league.your_slot,
        "keepers_allowed": league.keepers_allowed,
        "opponent_keepers_hint": opponent_keepers,
    });

    let compact_candidates: Vec<_> = candidates
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "team": c.team,
                "keep_overall": c.keep_overall,
                "keep_round": c.keep_round,
                "keep_pick": c.keep_pick,
                "keep_str": c.keep_str(),
            })
        })
        .collect();

    let mut prompt = String::with_capacity(2048);
    prompt.push_str("LEAGUE:\n");
    prompt.push_str(&league_summary.to_string());
    prompt.push_str("\n\nCANDIDATES:\n");
    prompt.push_str(&json!(compact_candidates).to_string());
    prompt.push_str(
        "\n\nTASK:\nEvaluate keeper value vs ADP under these league rules. \
         Account for other teams also keeping players (opponent_keepers_hint). \
         Output STRICT JSON per the schema below. Do not include backticks or any extra prose.",
    );
    prompt.push_str("\n\nSCHEMA:\n");
    prompt.push_str(KEEPER_SCHEMA);
    prompt
}

// ---------------------------------------------------------------------------
// Player comparison
// ---------------------------------------------------------------------------

/// System prompt for the comparison call.
pub fn compare_system_prompt() -> String {
    "You are a fantasy football expert for the current NFL season. \
     Your job is to help users make the best PPR draft choices based on current data. \
     Use only the structured data provided. \
     Base your recommendation on team roles, injuries, age, and projected usage. \
     Respond conversationally, as if advising a fantasy football player in a real draft."
        .to_string()
}

/// Build the user prompt for a comparison request: one formatted line per
/// player, then the question.
pub fn build_compare_prompt(players: &[ComparePlayer]) -> String {
    let mut lines = String::new();
    for (i, p) in players.iter().enumerate() {
        lines.push_str(&format!(
            "{}. {} | Team: {} | Position: {} | Injury: {} | Depth: {} | Age: {} | Rank: {}\n",
            i + 1,
            p.display_name(),
            field_or(p.team.as_deref(), "Unknown"),
            field_or(p.position.as_deref(), "Unknown"),
            field_or(p.injury_status.as_deref(), "None"),
            value_or(p.depth_chart_order.as_ref(), "None"),
            value_or(p.age.as_ref(), "None"),
            value_or(p.search_rank.as_ref(), "99999"),
        ));
    }

    format!(
        "Here are the draftable players:\n\n{}\n\
         In a 12-team PPR fantasy football draft, who should I pick and why?\n\
         Respond in two parts:\n\
         1. **Recommendation**: Give only the player's full name (short answer).\n\
         2. **Reasoning**: Give a clear, detailed explanation of why you recommend this player.",
        lines
    )
}

fn field_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => default,
    }
}

/// Render a loosely-typed field for the prompt: bare strings unquoted,
/// other JSON values via their display form.
fn value_or(value: Option<&serde_json::Value>, default: &str) -> String {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(serde_json::Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn league() -> LeagueSettings {
        LeagueSettings {
            teams: 12,
            format: "PPR".into(),
            qb_slots: 1,
            your_slot: 4,
            keepers_allowed: 2,
        }
    }

    fn candidate(name: &str, round: u32, pick: u32) -> KeeperCandidate {
        KeeperCandidate {
            name: name.into(),
            team: "KC".into(),
            keep_round: round,
            keep_pick: pick,
            keep_overall: (round - 1) * 12 + pick,
        }
    }

    // ---- Keeper prompt ----

    #[test]
    fn keeper_system_prompt_demands_strict_json() {
        let sp = keeper_system_prompt();
        assert!(sp.contains("ONLY valid JSON"), "must demand JSON output");
        assert!(sp.contains("draft capital matters"));
        assert!(sp.contains("opponent_keepers"));
    }

    #[test]
    fn keeper_prompt_embeds_league_and_candidates() {
        let prompt = build_keeper_prompt(
            &league(),
            22,
            &[candidate("Patrick Mahomes", 2, 11), candidate("Chris Olave", 7, 4)],
        );

        assert!(prompt.contains("LEAGUE:"), "should have league section");
        assert!(prompt.contains("\"teams\":12"), "league JSON should be compact");
        assert!(prompt.contains("\"opponent_keepers_hint\":22"));
        assert!(prompt.contains("CANDIDATES:"));
        assert!(prompt.contains("Patrick Mahomes"));
        assert!(prompt.contains("Chris Olave"));
        assert!(prompt.contains("\"keep_overall\":23"));
        assert!(prompt.contains("\"keep_str\":\"2.11\""));
        assert!(prompt.contains("SCHEMA:"), "should pin the schema");
        assert!(prompt.contains("estimated_adp_overall"));
        assert!(prompt.contains("Do not include backticks"));
    }

    // ---- Comparison prompt ----

    #[test]
    fn compare_prompt_numbers_the_players() {
        let players: Vec<ComparePlayer> = serde_json::from_value(serde_json::json!([
            {
                "search_full_name": "Justin Jefferson",
                "team": "MIN",
                "position": "WR",
                "injury_status": "Questionable",
                "depth_chart_order": 1,
                "age": 26,
                "search_rank": 3
            },
            {
                "first_name": "CeeDee",
                "last_name": "Lamb",
                "team": "DAL",
                "position": "WR"
            }
        ]))
        .unwrap();

        let prompt = build_compare_prompt(&players);
        assert!(prompt.contains("1. Justin Jefferson | Team: MIN | Position: WR | Injury: Questionable | Depth: 1 | Age: 26 | Rank: 3"));
        assert!(prompt.contains("2. CeeDee Lamb | Team: DAL | Position: WR | Injury: None | Depth: None | Age: None | Rank: 99999"));
        assert!(prompt.contains("who should I pick and why"));
        assert!(prompt.contains("**Recommendation**"));
    }

    #[test]
    fn compare_prompt_handles_fully_missing_fields() {
        let players = vec![ComparePlayer::default(), ComparePlayer::default()];
        let prompt = build_compare_prompt(&players);
        assert!(prompt.contains("1. Unknown Player | Team: Unknown"));
        assert!(prompt.contains("Rank: 99999"));
    }
}
