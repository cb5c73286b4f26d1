//! Remote client adapter: the four Notion operations the relay needs, each
//! classified into a success value or an [`ErrorResult`].
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ErrorCode, ErrorResult, RelayError};
use crate::model::{AccessToken, ObjectKind, Record, UploadItem, User};

pub mod model;
pub mod transport;

use self::model::{build_search_request, build_token_request, ErrorBody, OAuthErrorBody, SearchPage, UserResp};
pub use self::transport::{Auth, HttpTransport, NotionTransport, RemoteRequest, RemoteResponse};

#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Bearer used when a call carries no caller credential.
    pub default_token: String,
    pub redirect_uri: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            client_id: cfg.notion.client_id.clone(),
            client_secret: cfg.notion.client_secret.clone(),
            default_token: cfg.notion.client_secret.clone(),
            redirect_uri: cfg.notion.redirect_uri.clone(),
        }
    }
}

#[derive(Clone)]
pub struct NotionClient {
    transport: Arc<dyn NotionTransport>,
    credentials: Credentials,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(transport: Arc<dyn NotionTransport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, RelayError> {
        let base_url = Url::parse(&cfg.notion.api_base)
            .map_err(|err| RelayError::Validation(format!("invalid notion.api_base: {err}")))?;
        let transport = HttpTransport::new(
            base_url,
            cfg.notion.version.clone(),
            Duration::from_secs(cfg.notion.timeout_secs),
        )?;
        Ok(Self::new(Arc::new(transport), Credentials::from_config(cfg)))
    }

    fn bearer(&self, credential: Option<&str>) -> Auth {
        let token = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.credentials.default_token.as_str());
        Auth::Bearer(token.to_string())
    }

    async fn call(&self, request: RemoteRequest) -> Result<Value, RelayError> {
        let response = self.transport.send(request).await?;
        classify(response)
    }

    /// Search pages or databases by title, following every result page.
    /// Records come back in Notion's "last edited first" order.
    pub async fn search(
        &self,
        query: &str,
        kind: ObjectKind,
        credential: Option<&str>,
    ) -> Result<Vec<Record>, ErrorResult> {
        let auth = self.bearer(credential);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let body = build_search_request(query, kind, cursor.as_deref());
            let payload = self
                .call(RemoteRequest::post("v1/search", auth.clone(), body))
                .await
                .map_err(|err| {
                    warn!(%err, query, %kind, "notion search failed");
                    ErrorResult::generic(err)
                })?;
            let page: SearchPage = parse(payload).map_err(ErrorResult::generic)?;
            pages += 1;
            records.extend(page.results);

            match page.next_cursor {
                Some(next) if page.has_more => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        warn!(query, cursor = %next, "notion repeated a search cursor, stopping");
                        break;
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        info!(query, %kind, pages, results = records.len(), "notion search complete");
        Ok(records)
    }

    pub async fn retrieve_by_id(
        &self,
        id: &str,
        kind: ObjectKind,
        credential: Option<&str>,
    ) -> Result<Record, ErrorResult> {
        check_id(id).map_err(ErrorResult::detailed)?;
        let path = format!("v1/{}/{}", kind.collection(), id);
        let payload = self
            .call(RemoteRequest::get(path, self.bearer(credential)))
            .await
            .map_err(|err| {
                warn!(%err, id, %kind, "notion retrieve failed");
                ErrorResult::detailed(err)
            })?;
        parse(payload).map_err(ErrorResult::detailed)
    }

    pub async fn create_page(
        &self,
        item: &UploadItem,
        credential: Option<&str>,
    ) -> Result<Record, ErrorResult> {
        let payload = self
            .call(RemoteRequest::post(
                "v1/pages",
                self.bearer(credential),
                item.to_value(),
            ))
            .await
            .map_err(ErrorResult::detailed)?;
        let record: Record = parse(payload).map_err(ErrorResult::detailed)?;
        debug!(page_id = %record.id, "created notion page");
        Ok(record)
    }

    /// Exchange an OAuth authorization code for an access token. Persisting
    /// the token is left to the caller.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken, ErrorResult> {
        let auth = Auth::Basic {
            username: self.credentials.client_id.clone(),
            password: self.credentials.client_secret.clone(),
        };
        let body = build_token_request(code, self.credentials.redirect_uri.as_deref());
        let response = self
            .transport
            .send(RemoteRequest::post("v1/oauth/token", auth, body))
            .await
            .map_err(ErrorResult::detailed)?;

        // The token endpoint reports denial in the body, not only via status.
        if response.body.get("error").is_some() {
            let denied: OAuthErrorBody = parse(response.body).map_err(ErrorResult::detailed)?;
            warn!(error = %denied.error, status = response.status, "notion rejected authorization code");
            return Err(ErrorResult::new(
                denied.error_description.unwrap_or(denied.error),
                ErrorCode::Status(400),
            ));
        }

        let payload = classify(response).map_err(ErrorResult::detailed)?;
        let token: AccessToken = parse(payload).map_err(ErrorResult::detailed)?;
        info!(bot_id = %token.bot_id, workspace_id = %token.workspace_id, "exchanged authorization code");
        Ok(token)
    }

    pub async fn retrieve_user(
        &self,
        user_id: &str,
        credential: Option<&str>,
    ) -> Result<User, ErrorResult> {
        check_id(user_id).map_err(ErrorResult::detailed)?;
        let payload = self
            .call(RemoteRequest::get(
                format!("v1/users/{user_id}"),
                self.bearer(credential),
            ))
            .await
            .map_err(ErrorResult::detailed)?;
        let resp: UserResp = parse(payload).map_err(ErrorResult::detailed)?;
        Ok(resp.into())
    }
}

fn classify(response: RemoteResponse) -> Result<Value, RelayError> {
    if response.is_success() {
        return Ok(response.body);
    }
    let detail: ErrorBody = serde_json::from_value(response.body).unwrap_or_default();
    Err(RelayError::RemoteApi {
        status: response.status,
        code: detail
            .code
            .unwrap_or_else(|| response.status.to_string()),
        message: detail.message,
    })
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, RelayError> {
    serde_json::from_value(body).map_err(|err| RelayError::Parse(err.to_string()))
}

/// Notion ids are UUIDs with or without dashes.
fn check_id(id: &str) -> Result<(), RelayError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(RelayError::Validation(format!("invalid Notion id '{id}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_passes_success_body() {
        let body = classify(RemoteResponse {
            status: 200,
            body: json!({ "id": "x" }),
        })
        .unwrap();
        assert_eq!(body["id"], "x");
    }

    #[test]
    fn classify_reads_remote_code_and_message() {
        let err = classify(RemoteResponse {
            status: 404,
            body: json!({
                "object": "error",
                "status": 404,
                "code": "object_not_found",
                "message": "Could not find database with ID: abc."
            }),
        })
        .unwrap_err();
        assert_eq!(
            err,
            RelayError::RemoteApi {
                status: 404,
                code: "object_not_found".into(),
                message: Some("Could not find database with ID: abc.".into()),
            }
        );
    }

    #[test]
    fn classify_tolerates_non_json_error_body() {
        let err = classify(RemoteResponse {
            status: 502,
            body: Value::String("<html>bad gateway</html>".into()),
        })
        .unwrap_err();
        assert_eq!(
            err,
            RelayError::RemoteApi {
                status: 502,
                code: "502".into(),
                message: None,
            }
        );
    }

    #[test]
    fn ids_are_checked() {
        assert!(check_id("1b2c3d4e-0000-4000-8000-1234567890ab").is_ok());
        assert!(check_id("1b2c3d4e000040008000123456789").is_ok());
        assert!(check_id("").is_err());
        assert!(check_id("../oauth/token").is_err());
    }
}
