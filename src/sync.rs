// Player pool synchronization from the Sleeper public API.
//
// A sync is requested over an mpsc channel (the HTTP trigger returns 202
// immediately) and runs on a dedicated worker task: fetch the full NFL
// player map, filter to fantasy-relevant entries, and upsert the rest
// into the store.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::db::PlayerStore;
use crate::players::{PlayerRecord, Position};

/// Commands accepted by the sync worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    SyncPlayers,
}

/// One entry of the upstream player map. Most fields are nullable
/// upstream; entries missing the ones we need are skipped, not failed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SleeperPlayer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub search_full_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub injury_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Counters reported after a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub players_loaded: usize,
    pub players_skipped: usize,
}

/// Fetch the full player map from the upstream API.
pub async fn fetch_players(
    http: &reqwest::Client,
    url: &str,
) -> Result<HashMap<String, SleeperPlayer>> {
    let response = http
        .get(url)
        .send()
        .await
        .context("player fetch request failed")?
        .error_for_status()
        .context("player fetch returned an error status")?;

    response
        .json::<HashMap<String, SleeperPlayer>>()
        .await
        .context("player fetch body was not a player map")
}

/// Filter and upsert a fetched player map.
///
/// A player is stored only with a fantasy-relevant position, a team, and
/// a search name; everyone else (practice squadders, retired entries,
/// team defenses without names) counts as skipped.
pub fn store_players(
    store: &PlayerStore,
    players: &HashMap<String, SleeperPlayer>,
) -> Result<SyncOutcome> {
    let mut loaded = 0usize;
    let mut skipped = 0usize;

    for (player_id, data) in players {
        let position = data
            .position
            .as_deref()
            .and_then(Position::from_str_pos);
        let team = data.team.as_deref().filter(|t| !t.is_empty());
        let name = data.search_full_name.as_deref().filter(|n| !n.is_empty());

        let (Some(position), Some(team), Some(name)) = (position, team, name) else {
            skipped += 1;
            continue;
        };

        store.upsert_player(&PlayerRecord {
            player_id: player_id.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            search_full_name: name.to_string(),
            team: team.to_string(),
            position,
            injury_status: data.injury_status.clone(),
            status: data.status.clone(),
        })?;
        loaded += 1;
    }

    Ok(SyncOutcome {
        players_loaded: loaded,
        players_skipped: skipped,
    })
}

/// One full sync pass: fetch then store.
pub async fn run_sync(
    http: &reqwest::Client,
    url: &str,
    store: &PlayerStore,
) -> Result<SyncOutcome> {
    let players = fetch_players(http, url).await?;
    store_players(store, &players)
}

/// Worker loop: process sync commands until every sender is dropped.
/// Failures are logged and the worker keeps serving later commands.
pub async fn run_worker(
    mut rx: mpsc::Receiver<SyncCommand>,
    http: reqwest::Client,
    url: String,
    store: Arc<PlayerStore>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            SyncCommand::SyncPlayers => match run_sync(&http, &url, &store).await {
                Ok(outcome) => info!(
                    loaded = outcome.players_loaded,
                    skipped = outcome.players_skipped,
                    "player sync complete"
                ),
                Err(e) => error!("player sync failed: {e:#}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
