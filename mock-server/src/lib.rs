use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Canned record served by `GET /api`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
}

/// Acknowledgement served by `POST`/`PUT`/`DELETE /api`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

/// What the server saw, returned verbatim by `/echo`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/api", get(get_record).post(ack).put(ack).delete(ack))
        .route("/echo", any(echo))
        .route("/not-json", get(not_json))
        .route("/null", get(null_body))
        .route("/empty", any(empty))
        .route("/status/{code}", any(status))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_record(Query(query): Query<HashMap<String, String>>) -> Json<Record> {
    let id = query.get("id").and_then(|id| id.parse().ok()).unwrap_or_default();
    let name = query.get("name").cloned().unwrap_or_else(|| "a".to_string());
    Json(Record { id, name })
}

async fn ack() -> Json<Ack> {
    Json(Ack { ok: true })
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            (name.as_str().to_string(), value)
        })
        .collect();
    tracing::debug!(%method, %uri, "echoing request");
    Json(Echo {
        method: method.to_string(),
        uri: uri.to_string(),
        headers,
        body,
    })
}

async fn not_json() -> &'static str {
    "not-json"
}

async fn null_body() -> ([(&'static str, &'static str); 1], &'static str) {
    ([("content-type", "application/json")], "null")
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn status(Path(code): Path<u16>) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let reason = status.canonical_reason().unwrap_or("unknown");
    (status, Json(json!({ "error": reason, "code": status.as_u16() })))
}
