//! One-shot OAuth code exchange.
//!
//! A [`TokenExchange`] starts `Pending` and is consumed by [`TokenExchange::run`],
//! so the same authorization code can never be sent to Notion twice.
use tracing::{info, instrument, warn};

use crate::db::TokenStore;
use crate::error::{ErrorCode, ErrorResult};
use crate::model::AccessToken;
use crate::notion::NotionClient;

#[derive(Debug)]
pub struct TokenExchange {
    code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    Exchanged(AccessToken),
    Rejected(ErrorResult),
}

impl ExchangeOutcome {
    pub fn into_result(self) -> Result<AccessToken, ErrorResult> {
        match self {
            ExchangeOutcome::Exchanged(token) => Ok(token),
            ExchangeOutcome::Rejected(err) => Err(err),
        }
    }
}

impl TokenExchange {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Exchange the code, then persist the token and its owning user. Storage
    /// problems are logged and never turn an exchanged token into a rejection.
    #[instrument(skip_all)]
    pub async fn run(self, client: &NotionClient, store: &dyn TokenStore) -> ExchangeOutcome {
        if self.code.trim().is_empty() {
            return ExchangeOutcome::Rejected(ErrorResult::new(
                "authorization code must be non-empty",
                ErrorCode::Status(400),
            ));
        }

        let token = match client.exchange_code(&self.code).await {
            Ok(token) => token,
            Err(err) => return ExchangeOutcome::Rejected(err),
        };

        if !store.upsert_access_token(&token).await {
            warn!(bot_id = %token.bot_id, "access token not persisted");
        }
        store_owner(client, store, &token).await;

        info!(bot_id = %token.bot_id, "token exchange complete");
        ExchangeOutcome::Exchanged(token)
    }
}

async fn store_owner(client: &NotionClient, store: &dyn TokenStore, token: &AccessToken) {
    let Some(user_id) = token.owner_user_id() else {
        return;
    };
    match client
        .retrieve_user(user_id, Some(&token.access_token))
        .await
    {
        Ok(user) => {
            if !store.upsert_user(&user).await {
                warn!(user_id, "owner user not persisted");
            }
        }
        Err(err) => warn!(user_id, code = %err.code, message = %err.message, "failed to fetch owner user"),
    }
}
