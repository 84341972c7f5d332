//! HTTP front-end
//!
//! | Method | Path | Body | Response |
//! |---|---|---|---|
//! | POST | `/query` | `{"query": "<statement>"}` | `{"result": [[column metadata], row, ...]}` |
//!
//! All requests share one [`Engine`] behind an async mutex, so statements run
//! one at a time in arrival order.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::engine::Engine;

/// Shared state for the query handler
#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Mutex<Engine>>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

pub fn build_router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(Mutex::new(engine)),
    };
    Router::new()
        .route("/query", post(handle_query))
        .with_state(state)
}

/// Serve until ctrl-c
pub async fn serve(engine: Engine, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "query server listening");

    axum::serve(listener, build_router(engine))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
}

fn error_response(msg: &str, status: StatusCode) -> axum::response::Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

/// POST /query
async fn handle_query(
    State(state): State<ServerState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> impl IntoResponse {
    let query = match body {
        Ok(Json(QueryRequest { query: Some(q) })) if !q.trim().is_empty() => q,
        Ok(_) => return error_response("Query not provided", StatusCode::BAD_REQUEST),
        Err(rejection) => return error_response(&rejection.body_text(), StatusCode::BAD_REQUEST),
    };

    debug!(%query, "http query");
    let result = state.engine.lock().await.execute(&query).await;
    Json(json!({ "result": result.to_table() })).into_response()
}
