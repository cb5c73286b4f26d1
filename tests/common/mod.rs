#![allow(dead_code)]

use async_trait::async_trait;
use notion_relay::db::{self, Pool, SqliteStore};
use notion_relay::error::RelayError;
use notion_relay::model::UploadItem;
use notion_relay::notion::{
    Credentials, NotionClient, NotionTransport, RemoteRequest, RemoteResponse,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_TOKEN: &str = "secret_default";

/// Fake transport: answers from a queue and records every request.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    responses: Arc<Mutex<VecDeque<Result<RemoteResponse, RelayError>>>>,
    requests: Arc<Mutex<Vec<RemoteRequest>>>,
}

impl RecordingTransport {
    pub fn with_responses(responses: Vec<Result<RemoteResponse, RelayError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    pub async fn requests(&self) -> Vec<RemoteRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl NotionTransport for RecordingTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, RelayError> {
        self.requests.lock().await.push(request);
        self.responses.lock().await.pop_front().unwrap_or_else(|| {
            Ok(error_response(
                500,
                "internal_server_error",
                "no scripted response",
            ))
        })
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        default_token: DEFAULT_TOKEN.into(),
        redirect_uri: None,
    }
}

pub fn client(transport: &RecordingTransport) -> NotionClient {
    NotionClient::new(Arc::new(transport.clone()), credentials())
}

pub fn ok(body: Value) -> Result<RemoteResponse, RelayError> {
    Ok(RemoteResponse { status: 200, body })
}

pub fn error_response(status: u16, code: &str, message: &str) -> RemoteResponse {
    RemoteResponse {
        status,
        body: json!({
            "object": "error",
            "status": status,
            "code": code,
            "message": message,
        }),
    }
}

pub fn fail(status: u16, code: &str, message: &str) -> Result<RemoteResponse, RelayError> {
    Ok(error_response(status, code, message))
}

pub fn page_json(id: &str) -> Value {
    json!({
        "object": "page",
        "id": id,
        "created_time": "2024-04-20T10:00:00.000Z",
        "last_edited_time": "2024-04-21T10:00:00.000Z",
        "archived": false,
        "properties": {}
    })
}

pub fn database_json(id: &str) -> Value {
    json!({
        "object": "database",
        "id": id,
        "last_edited_time": "2024-04-21T10:00:00.000Z",
        "title": [{ "plain_text": "Papers" }],
        "properties": {}
    })
}

pub fn search_page(ids: &[String], next_cursor: Option<&str>) -> Value {
    let results: Vec<Value> = ids.iter().map(|id| database_json(id)).collect();
    json!({
        "object": "list",
        "results": results,
        "next_cursor": next_cursor,
        "has_more": next_cursor.is_some(),
        "type": "page_or_database",
        "page_or_database": {}
    })
}

pub fn token_json(bot_id: &str, owner_user_id: &str) -> Value {
    json!({
        "access_token": format!("secret_{bot_id}"),
        "token_type": "bearer",
        "bot_id": bot_id,
        "workspace_name": "Reading list",
        "workspace_icon": null,
        "workspace_id": "bcd261e7-7a99-4e9d-8879-d59797d89959",
        "owner": { "type": "user", "user": { "object": "user", "id": owner_user_id } },
        "duplicated_template_id": null,
        "request_id": "be782dc8-d649-4834-abb4-acca08663140"
    })
}

pub fn user_json(id: &str) -> Value {
    json!({
        "object": "user",
        "id": id,
        "type": "person",
        "name": "Ada Lovelace",
        "avatar_url": "https://example.com/ada.png",
        "person": { "email": "ada@example.com" }
    })
}

pub fn upload_item(title: &str) -> UploadItem {
    serde_json::from_value(json!({
        "parent": { "database_id": "db-works" },
        "properties": {
            "Name": { "title": [{ "text": { "content": title } }] }
        }
    }))
    .unwrap()
}

pub async fn setup_pool() -> Pool {
    let pool = db::init_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

pub async fn setup_store() -> SqliteStore {
    SqliteStore::new(setup_pool().await)
}
