//! Row models returned by repository reads.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredAccessToken {
    pub bot_id: String,
    pub access_token: String,
    pub token_type: String,
    pub owner_user_id: Option<String>,
    pub duplicated_template_id: Option<String>,
    pub workspace_id: String,
    pub workspace_name: Option<String>,
    pub workspace_icon: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredUser {
    pub id: String,
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: NaiveDateTime,
}
