use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{info, instrument};

use super::envelope::ApiResponse;
use super::AppState;
use crate::error::{ErrorCode, ErrorResult};
use crate::model::{ObjectKind, UploadItem};
use crate::oauth::TokenExchange;
use crate::upload;

#[derive(Debug, Deserialize)]
pub struct UploadWorksRequest {
    pub data: Vec<UploadItem>,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchByTitleRequest {
    pub query: String,
    pub search_for: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageDatabaseRequest {
    #[serde(rename = "PDId")]
    pub pd_id: String,
    #[serde(rename = "PDType")]
    pub pd_type: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeCodeRequest {
    pub code: String,
}

fn bad_request(message: impl Into<String>) -> ApiResponse {
    ApiResponse::from_error(ErrorResult::new(message, ErrorCode::Status(400)))
}

fn parse_kind(raw: &str) -> Result<ObjectKind, ApiResponse> {
    raw.parse::<ObjectKind>()
        .map_err(|err| ApiResponse::from_error(ErrorResult::generic(err)))
}

/// POST /upload-works
///
/// Answers with the failed items only; `success` is true iff none failed.
#[instrument(skip_all)]
pub async fn upload_works(
    State(state): State<AppState>,
    payload: Result<Json<UploadWorksRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let total = req.data.len();
    let outcomes = upload::upload_works(
        &state.notion,
        req.data,
        state.default_database.as_deref(),
        Some(&req.access_token),
    )
    .await;
    let failed = upload::failures(outcomes);
    info!(total, failed = failed.len(), "upload-works handled");

    if failed.is_empty() {
        return ApiResponse::ok(failed);
    }
    let message = format!("{} of {} works failed to upload", failed.len(), total);
    let mut resp = ApiResponse::ok(failed).with_message(message);
    resp.success = false;
    resp
}

/// POST /search-by-title
#[instrument(skip_all)]
pub async fn search_by_title(
    State(state): State<AppState>,
    payload: Result<Json<SearchByTitleRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let kind = match parse_kind(&req.search_for) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };

    match state
        .notion
        .search(&req.query, kind, req.access_token.as_deref())
        .await
    {
        Ok(records) if records.is_empty() => {
            ApiResponse::from_error(ErrorResult::new("no results", ErrorCode::Status(404)))
                .with_status(StatusCode::NOT_FOUND)
        }
        Ok(records) => ApiResponse::ok(records),
        Err(err) => ApiResponse::from_error(err).with_status(StatusCode::NOT_FOUND),
    }
}

async fn page_database(state: AppState, req: PageDatabaseRequest) -> ApiResponse {
    let kind = match parse_kind(&req.pd_type) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    match state
        .notion
        .retrieve_by_id(&req.pd_id, kind, req.access_token.as_deref())
        .await
    {
        Ok(record) => ApiResponse::ok(record),
        Err(err) => ApiResponse::from_error(err),
    }
}

/// GET /page-database/?PDId=..&PDType=..
#[instrument(skip_all)]
pub async fn page_database_query(
    State(state): State<AppState>,
    query: Result<Query<PageDatabaseRequest>, QueryRejection>,
) -> ApiResponse {
    match query {
        Ok(Query(req)) => page_database(state, req).await,
        Err(rejection) => bad_request(rejection.body_text()),
    }
}

/// POST /page-database/
#[instrument(skip_all)]
pub async fn page_database_json(
    State(state): State<AppState>,
    payload: Result<Json<PageDatabaseRequest>, JsonRejection>,
) -> ApiResponse {
    match payload {
        Ok(Json(req)) => page_database(state, req).await,
        Err(rejection) => bad_request(rejection.body_text()),
    }
}

/// POST /exchange-code-for-token
#[instrument(skip_all)]
pub async fn exchange_code_for_token(
    State(state): State<AppState>,
    payload: Result<Json<ExchangeCodeRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let outcome = TokenExchange::new(req.code)
        .run(&state.notion, state.store.as_ref())
        .await;
    match outcome.into_result() {
        Ok(token) => ApiResponse::ok(token),
        Err(err) => ApiResponse::from_error(err),
    }
}
