//! REST collection store integration tests.
//!
//! Starts an axum server that mimics the hosted REST surface and
//! exercises the store (and an engine on top of it) with reqwest.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use coin_vault::config::{ReorderConfig, RestConfig};
use coin_vault::domain::{BatchReply, DomainError, RankUpdate};
use coin_vault::reorder::{ReorderEngine, ReorderError, ReorderOutcome};
use coin_vault::repository::{CollectionStore, RestCollectionStore};

const OWNER: &str = "collector@example.com";
const API_KEY: &str = "anon-key";

#[derive(Clone, Default)]
struct Mock {
    rows: Arc<Mutex<Vec<Value>>>,
    list_status: Arc<Mutex<Option<StatusCode>>>,
    rpc_reply: Arc<Mutex<Option<(StatusCode, String)>>>,
    last_query: Arc<Mutex<HashMap<String, String>>>,
    last_apikey: Arc<Mutex<Option<String>>>,
    last_rpc_body: Arc<Mutex<Option<Value>>>,
}

impl Mock {
    fn with_coins(ranks: &[(u32, u32)]) -> Self {
        let rows = ranks
            .iter()
            .map(|(id, rank)| {
                json!({
                    "id": id,
                    "Owner Email": OWNER,
                    "Priority": rank,
                    "Coin Name": format!("Coin {}", id),
                    "Public Display": id % 2 == 0,
                })
            })
            .collect();
        Self {
            rows: Arc::new(Mutex::new(rows)),
            ..Default::default()
        }
    }

    fn reply_rpc(&self, status: StatusCode, body: &str) {
        *self.rpc_reply.lock().unwrap() = Some((status, body.to_string()));
    }
}

async fn list_coins(
    State(mock): State<Mock>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    *mock.last_query.lock().unwrap() = query;
    *mock.last_apikey.lock().unwrap() = headers
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(status) = *mock.list_status.lock().unwrap() {
        return (status, HeaderMap::new(), Json(json!({"message": "boom"})));
    }

    let rows = mock.rows.lock().unwrap().clone();
    let mut out = HeaderMap::new();
    out.insert("content-range", format!("0-{}/42", rows.len().saturating_sub(1)).parse().unwrap());
    (StatusCode::OK, out, Json(Value::Array(rows)))
}

async fn update_priorities(State(mock): State<Mock>, Json(body): Json<Value>) -> (StatusCode, String) {
    *mock.last_rpc_body.lock().unwrap() = Some(body.clone());
    if let Some(reply) = mock.rpc_reply.lock().unwrap().clone() {
        return reply;
    }

    // apply like the stored procedure would
    let mut rows = mock.rows.lock().unwrap();
    for update in body["updates"].as_array().cloned().unwrap_or_default() {
        if let Some(row) = rows.iter_mut().find(|r| r["id"] == update["id"]) {
            row["Priority"] = update["priority"].clone();
        }
    }
    (StatusCode::OK, "\"success\"".to_string())
}

/// Bind to port 0 and return the actual address.
async fn start_server(mock: Mock) -> String {
    let app = Router::new()
        .route("/rest/v1/coins", get(list_coins))
        .route("/rest/v1/rpc/update_coin_priorities", post(update_priorities))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn store_for(base_url: String) -> RestCollectionStore {
    RestCollectionStore::new(RestConfig {
        base_url,
        api_key: API_KEY.to_string(),
        timeout_ms: 2_000,
        ..Default::default()
    })
    .expect("client")
}

#[tokio::test]
async fn fetch_maps_rows_and_total() {
    let mock = Mock::with_coins(&[(10, 2), (11, 1), (12, 3)]);
    let base = start_server(mock.clone()).await;
    let store = store_for(base);

    let page = store.fetch_ordered_items(OWNER).await.expect("fetch");

    assert_eq!(page.coins.iter().map(|c| c.id).collect::<Vec<_>>(), vec![11, 10, 12]);
    assert_eq!(page.total, 42);
    assert_eq!(page.coins[1].display.name, "Coin 10");
    assert!(page.coins[1].display.is_public);

    let query = mock.last_query.lock().unwrap().clone();
    assert_eq!(query.get("Owner Email").map(String::as_str), Some(r#"eq."collector@example.com""#));
    assert_eq!(query.get("order").map(String::as_str), Some("Priority.asc"));
    assert_eq!(mock.last_apikey.lock().unwrap().as_deref(), Some(API_KEY));
}

#[tokio::test]
async fn fetch_quotes_owner_with_reserved_characters() {
    let mock = Mock::with_coins(&[]);
    let store = store_for(start_server(mock.clone()).await);

    store.fetch_ordered_items("smith, j (navy)").await.expect("fetch");

    let query = mock.last_query.lock().unwrap().clone();
    assert_eq!(query.get("Owner Email").map(String::as_str), Some(r#"eq."smith, j (navy)""#));
    assert_eq!(query.len(), 3);
}

#[tokio::test]
async fn fetch_error_status_is_an_error() {
    let mock = Mock::with_coins(&[]);
    *mock.list_status.lock().unwrap() = Some(StatusCode::INTERNAL_SERVER_ERROR);
    let store = store_for(start_server(mock).await);

    let err = store.fetch_ordered_items(OWNER).await.unwrap_err();
    assert!(matches!(err, DomainError::Internal(_)));
}

#[tokio::test]
async fn batch_update_sends_every_pair() {
    let mock = Mock::with_coins(&[(1, 1), (2, 2)]);
    let store = store_for(start_server(mock.clone()).await);

    let reply = store
        .batch_update_ranks(&[RankUpdate { id: 2, rank: 1 }, RankUpdate { id: 1, rank: 2 }])
        .await
        .expect("rpc");

    assert_eq!(reply, BatchReply::Success);
    assert_eq!(
        mock.last_rpc_body.lock().unwrap().clone(),
        Some(json!({"updates": [{"id": 2, "priority": 1}, {"id": 1, "priority": 2}]}))
    );
}

#[tokio::test]
async fn batch_error_status_is_a_rejection() {
    let mock = Mock::with_coins(&[(1, 1)]);
    mock.reply_rpc(StatusCode::BAD_REQUEST, r#"{"message": "function failed", "code": "P0001"}"#);
    let store = store_for(start_server(mock).await);

    let reply = store.batch_update_ranks(&[RankUpdate { id: 1, rank: 1 }]).await.unwrap();
    assert_eq!(reply, BatchReply::Rejected("function failed".to_string()));
}

#[tokio::test]
async fn batch_unexpected_body_is_malformed() {
    let mock = Mock::with_coins(&[(1, 1)]);
    mock.reply_rpc(StatusCode::OK, "[]");
    let store = store_for(start_server(mock).await);

    let reply = store.batch_update_ranks(&[RankUpdate { id: 1, rank: 1 }]).await.unwrap();
    assert!(matches!(reply, BatchReply::Malformed(_)));
}

#[tokio::test]
async fn engine_commits_through_rest() {
    let mock = Mock::with_coins(&[(1, 1), (2, 2), (3, 3)]);
    let base = start_server(mock).await;
    let engine = ReorderEngine::new(OWNER, Arc::new(store_for(base.clone())), ReorderConfig::default());
    engine.load().await.unwrap();

    assert!(engine.begin_drag(2));
    assert_eq!(engine.end_drag(Some(0)).await, ReorderOutcome::Committed);
    assert_eq!(engine.view().ids(), vec![3, 1, 2]);

    // a fresh engine sees the stored order
    let again = ReorderEngine::new(OWNER, Arc::new(store_for(base)), ReorderConfig::default());
    again.load().await.unwrap();
    assert_eq!(again.view().ids(), vec![3, 1, 2]);
}

#[tokio::test]
async fn engine_restores_after_rest_rejection() {
    let mock = Mock::with_coins(&[(1, 1), (2, 2), (3, 3)]);
    mock.reply_rpc(StatusCode::OK, r#"{"error": "coin 3 is being transferred"}"#);
    let store = Arc::new(store_for(start_server(mock).await));
    let engine = ReorderEngine::new(OWNER, store, ReorderConfig::default());
    engine.load().await.unwrap();

    engine.begin_drag(0);
    let outcome = engine.end_drag(Some(1)).await;

    assert_eq!(
        outcome,
        ReorderOutcome::Restored {
            error: ReorderError::Rejected("coin 3 is being transferred".to_string())
        }
    );
    assert_eq!(engine.view().ids(), vec![1, 2, 3]);
}
