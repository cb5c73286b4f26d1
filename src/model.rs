use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Page,
    Database,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Page => "page",
            ObjectKind::Database => "database",
        }
    }

    /// Path segment of the retrieve endpoint for this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            ObjectKind::Page => "pages",
            ObjectKind::Database => "databases",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(ObjectKind::Page),
            "database" => Ok(ObjectKind::Database),
            other => Err(RelayError::Validation(format!(
                "unsupported object kind '{other}', expected 'page' or 'database'"
            ))),
        }
    }
}

/// A page or database object as returned by Notion. Fields other than `id`
/// and `object` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub object: ObjectKind,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn last_edited_time(&self) -> Option<&str> {
        self.fields.get("last_edited_time").and_then(Value::as_str)
    }
}

/// Page-creation body for one work, forwarded to Notion as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadItem(pub Map<String, Value>);

impl UploadItem {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self(properties)
    }

    pub fn has_parent(&self) -> bool {
        self.0.get("parent").is_some_and(|p| !p.is_null())
    }

    /// Target `database_id` when no parent was supplied by the caller.
    pub fn with_default_parent(mut self, database_id: &str) -> Self {
        if !self.has_parent() {
            self.0.insert(
                "parent".into(),
                serde_json::json!({ "database_id": database_id }),
            );
        }
        self
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for UploadItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// OAuth token record returned by the code exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub bot_id: String,
    pub token_type: String,
    pub workspace_id: String,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub workspace_icon: Option<String>,
    #[serde(default)]
    pub duplicated_template_id: Option<String>,
    #[serde(default, deserialize_with = "owner_or_unknown")]
    pub owner: TokenOwner,
}

impl AccessToken {
    pub fn owner_user_id(&self) -> Option<&str> {
        match &self.owner {
            TokenOwner::User { user } => Some(user.id.as_str()),
            _ => None,
        }
    }
}

/// Who authorised the integration. Notion documents a workspace-level owner
/// that has not been observed in practice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenOwner {
    User {
        user: OwnerUser,
    },
    Workspace {
        #[serde(default)]
        workspace: bool,
    },
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerUser {
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
}

fn owner_or_unknown<'de, D>(deserializer: D) -> Result<TokenOwner, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or(TokenOwner::Unknown))
}

/// Notion user as stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}
