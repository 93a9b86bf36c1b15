// HTTP API: player queries, sync trigger, comparison, and keeper
// recommendations.
//
// Thin transport glue over the store, the sync channel, and the request
// orchestrators. Client errors surface the validation message; server
// errors log the cause and return a generic body.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::config::LlmSettings;
use crate::db::PlayerStore;
use crate::llm::client::ChatModel;
use crate::players::Position;
use crate::recommend::{self, ApiError};
use crate::sync::SyncCommand;

// ---------------------------------------------------------------------------
// Application context
// ---------------------------------------------------------------------------

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<PlayerStore>,
    pub model: Arc<dyn ChatModel>,
    pub llm: LlmSettings,
    pub sync_tx: mpsc::Sender<SyncCommand>,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Assemble the full route tree.
pub fn routes(
    ctx: AppContext,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_ctx = {
        let ctx = ctx.clone();
        warp::any().map(move || ctx.clone())
    };

    let sync = warp::path!("players" / "sync")
        .and(warp::post())
        .and(with_ctx.clone())
        .and_then(trigger_sync);

    let players = warp::path!("players")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_ctx.clone())
        .and_then(get_players);

    let compare = warp::path!("compare")
        .and(warp::post())
        .and(warp::body::json::<Value>())
        .and(with_ctx.clone())
        .and_then(post_compare);

    let keepers = warp::path!("keepers")
        .and(warp::post())
        .and(warp::body::json::<Value>())
        .and(with_ctx)
        .and_then(post_keepers);

    sync.or(players)
        .or(compare)
        .or(keepers)
        .recover(handle_rejection)
}

/// Bind and run the HTTP server until ctrl-c.
pub async fn serve(ctx: AppContext, port: u16) -> anyhow::Result<()> {
    let (addr, server) = warp::serve(routes(ctx))
        .try_bind_with_graceful_shutdown(([127, 0, 0, 1], port), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .with_context(|| format!("failed to bind HTTP server on port {port}"))?;

    info!("HTTP server listening on {addr}");
    server.await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_players(
    params: HashMap<String, String>,
    ctx: AppContext,
) -> Result<impl Reply, Infallible> {
    let position = params.get("position").map(String::as_str).unwrap_or("All");

    let result = if position.eq_ignore_ascii_case("all") {
        ctx.store.all_players()
    } else {
        match Position::from_str_pos(position) {
            Some(pos) => ctx.store.players_by_position(pos),
            None => return Ok(error_reply(StatusCode::BAD_REQUEST, "Invalid position")),
        }
    };

    match result {
        Ok(players) => Ok(json_reply(StatusCode::OK, &json!(players))),
        Err(e) => {
            error!("player query failed: {e:#}");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
    }
}

async fn trigger_sync(ctx: AppContext) -> Result<impl Reply, Infallible> {
    match ctx.sync_tx.send(SyncCommand::SyncPlayers).await {
        Ok(()) => Ok(json_reply(
            StatusCode::ACCEPTED,
            &json!({ "message": "Player sync initiated" }),
        )),
        Err(e) => {
            error!("failed to enqueue player sync: {e}");
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initiate player sync",
            ))
        }
    }
}

async fn post_compare(body: Value, ctx: AppContext) -> Result<impl Reply, Infallible> {
    match recommend::compare_players(ctx.model.as_ref(), &ctx.llm, &body).await {
        Ok(response) => Ok(json_reply(StatusCode::OK, &response)),
        Err(e) => Ok(api_error_reply(&e)),
    }
}

async fn post_keepers(body: Value, ctx: AppContext) -> Result<impl Reply, Infallible> {
    match recommend::recommend_keepers(ctx.model.as_ref(), &ctx.llm, &body).await {
        Ok(response) => Ok(json_reply(StatusCode::OK, &response)),
        Err(e) => Ok(api_error_reply(&e)),
    }
}

// ---------------------------------------------------------------------------
// Reply helpers
// ---------------------------------------------------------------------------

fn json_reply(
    status: StatusCode,
    value: &Value,
) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(value), status)
}

fn error_reply(status: StatusCode, message: &str) -> warp::reply::WithStatus<warp::reply::Json> {
    json_reply(status, &json!({ "error": message }))
}

fn api_error_reply(e: &ApiError) -> warp::reply::WithStatus<warp::reply::Json> {
    match e {
        ApiError::BadRequest(message) => error_reply(StatusCode::BAD_REQUEST, message),
        ApiError::Generation { message, source } => {
            error!("generation request failed: {source:#}");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Convert framework rejections into the same error body shape the
/// handlers use.
async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    if rejection.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not found"));
    }
    if rejection
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "Body must be valid JSON.",
        ));
    }
    if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
        ));
    }

    error!("unhandled rejection: {rejection:?}");
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::ChatRequest;
    use crate::players::PlayerRecord;
    use async_trait::async_trait;

    struct FakeModel {
        reply: String,
    }

    #[async_trait]
    impl ChatModel for FakeModel {
        async fn complete(&self, _request: ChatRequest) -> anyhow::Result<String> {
            Ok(self.reply.clone())
        }
    }

    fn context(reply: &str) -> (AppContext, mpsc::Receiver<SyncCommand>) {
        let (sync_tx, sync_rx) = mpsc::channel(4);
        let ctx = AppContext {
            store: Arc::new(PlayerStore::open(":memory:").unwrap()),
            model: Arc::new(FakeModel {
                reply: reply.to_string(),
            }),
            llm: LlmSettings {
                model: "gpt-4o".into(),
                max_tokens: 2048,
                keeper_temperature: 0.2,
                compare_temperature: 0.7,
            },
            sync_tx,
        };
        (ctx, sync_rx)
    }

    fn stored_player(id: &str, name: &str, position: Position) -> PlayerRecord {
        PlayerRecord {
            player_id: id.into(),
            first_name: None,
            last_name: None,
            search_full_name: name.into(),
            team: "KC".into(),
            position,
            injury_status: None,
            status: Some("Active".into()),
        }
    }

    #[tokio::test]
    async fn players_rejects_unknown_position() {
        let (ctx, _rx) = context("{}");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("GET")
            .path("/players?position=COACH")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "Invalid position");
    }

    #[tokio::test]
    async fn players_filters_by_position() {
        let (ctx, _rx) = context("{}");
        ctx.store
            .upsert_player(&stored_player("1", "patrickmahomes", Position::QB))
            .unwrap();
        ctx.store
            .upsert_player(&stored_player("2", "justinjefferson", Position::WR))
            .unwrap();
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("GET")
            .path("/players?position=qb")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["search_full_name"], "patrickmahomes");

        // No position parameter scans everything.
        let resp = warp::test::request()
            .method("GET")
            .path("/players")
            .reply(&routes)
            .await;
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sync_trigger_enqueues_and_returns_202() {
        let (ctx, mut rx) = context("{}");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/players/sync")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["message"], "Player sync initiated");
        assert_eq!(rx.try_recv().unwrap(), SyncCommand::SyncPlayers);
    }

    #[tokio::test]
    async fn compare_requires_two_players() {
        let (ctx, _rx) = context("pick Jefferson");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/compare")
            .json(&json!({"players": [{"search_full_name": "Solo"}]}))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "Provide at least two players to compare.");
    }

    #[tokio::test]
    async fn compare_happy_path() {
        let (ctx, _rx) = context("Justin Jefferson. Best available.");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/compare")
            .json(&json!({"players": [
                {"search_full_name": "Justin Jefferson"},
                {"search_full_name": "CeeDee Lamb"}
            ]}))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["recommendation"], "Justin Jefferson. Best available.");
    }

    #[tokio::test]
    async fn keepers_invalid_league_is_400() {
        let (ctx, _rx) = context("{}");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/keepers")
            .json(&json!({
                "league": {"teams": 12, "your_slot": 13, "keepers_allowed": 2},
                "players": [{"player": "A", "meta": {"round": 1, "pick": 1}, "keeper_overall": 1}]
            }))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn keepers_non_json_body_is_400() {
        let (ctx, _rx) = context("{}");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/keepers")
            .header("content-type", "application/json")
            .body("this is not json")
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "Body must be valid JSON.");
    }

    #[tokio::test]
    async fn keepers_model_garbage_is_500_generic() {
        let (ctx, _rx) = context("not json at all");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/keepers")
            .json(&json!({
                "league": {"teams": 12, "your_slot": 1, "keepers_allowed": 1},
                "players": [{"player": "A", "meta": {"round": 2, "pick": 1}, "keeper_overall": 13}]
            }))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "Failed to generate recommendations.");
    }

    #[tokio::test]
    async fn keepers_happy_path_returns_ranked_response() {
        let reply = json!({
            "assumptions": {"opponent_keepers": 11, "notes": ""},
            "recommendations": {
                "keep": [{
                    "player": "A",
                    "estimated_adp_overall": 5,
                    "risk_notes": [],
                    "reasoning": "discount"
                }],
                "bench": []
            },
            "summary": "keep A"
        })
        .to_string();
        let (ctx, _rx) = context(&reply);
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("POST")
            .path("/keepers")
            .json(&json!({
                "league": {"teams": 12, "your_slot": 1, "keepers_allowed": 1},
                "players": [{"player": "A", "meta": {"round": 2, "pick": 1}, "keeper_overall": 13}]
            }))
            .reply(&routes)
            .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["summary"], "keep A");
        assert_eq!(body["recommendations"]["keep"][0]["value_vs_adp"], 8);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (ctx, _rx) = context("{}");
        let routes = routes(ctx);

        let resp = warp::test::request()
            .method("GET")
            .path("/nope")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
