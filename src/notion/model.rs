use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::{ObjectKind, Record, User};

/// Notion caps `page_size` at 100.
pub const SEARCH_PAGE_SIZE: u32 = 100;

#[derive(Deserialize, Debug)]
pub struct SearchPage {
    pub results: Vec<Record>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Error body returned by Notion for non-2xx responses.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the OAuth token endpoint.
#[derive(Deserialize, Debug)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UserResp {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub person: Option<Person>,
}

#[derive(Deserialize, Debug)]
pub struct Person {
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserResp> for User {
    fn from(resp: UserResp) -> Self {
        User {
            id: resp.id,
            kind: resp.kind,
            email: resp.person.and_then(|p| p.email),
            name: resp.name,
            avatar_url: resp.avatar_url,
        }
    }
}

/// Body for `POST v1/search`, most recently edited first.
pub fn build_search_request(query: &str, kind: ObjectKind, cursor: Option<&str>) -> Value {
    let mut body = json!({
        "query": query,
        "filter": { "value": kind.as_str(), "property": "object" },
        "sort": { "direction": "descending", "timestamp": "last_edited_time" },
        "page_size": SEARCH_PAGE_SIZE,
    });
    if let Some(cursor) = cursor {
        body["start_cursor"] = Value::String(cursor.to_string());
    }
    body
}

pub fn build_token_request(code: &str, redirect_uri: Option<&str>) -> Value {
    let mut body = json!({
        "grant_type": "authorization_code",
        "code": code,
    });
    if let Some(uri) = redirect_uri {
        body["redirect_uri"] = Value::String(uri.to_string());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_filters_and_sorts() {
        let body = build_search_request("attention", ObjectKind::Database, None);
        assert_eq!(body["query"], "attention");
        assert_eq!(body["filter"]["value"], "database");
        assert_eq!(body["filter"]["property"], "object");
        assert_eq!(body["sort"]["timestamp"], "last_edited_time");
        assert_eq!(body["sort"]["direction"], "descending");
        assert_eq!(body["page_size"], 100);
        assert!(body.get("start_cursor").is_none());

        let next = build_search_request("attention", ObjectKind::Page, Some("cur-2"));
        assert_eq!(next["start_cursor"], "cur-2");
        assert_eq!(next["filter"]["value"], "page");
    }

    #[test]
    fn token_request_optional_redirect() {
        let body = build_token_request("code-1", None);
        assert_eq!(body["grant_type"], "authorization_code");
        assert_eq!(body["code"], "code-1");
        assert!(body.get("redirect_uri").is_none());
        let body = build_token_request("code-1", Some("https://app/callback"));
        assert_eq!(body["redirect_uri"], "https://app/callback");
    }

    #[test]
    fn user_lifts_person_email() {
        let resp: UserResp = serde_json::from_value(json!({
            "object": "user",
            "id": "u-1",
            "type": "person",
            "name": "Ada",
            "avatar_url": null,
            "person": { "email": "ada@example.com" }
        }))
        .unwrap();
        let user = User::from(resp);
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.kind.as_deref(), Some("person"));
        assert!(user.avatar_url.is_none());
    }
}
