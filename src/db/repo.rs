use super::model::{StoredAccessToken, StoredUser};
use crate::model::{AccessToken, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let in_memory = normalized.starts_with("sqlite::memory");
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {normalized}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    let pool = pool_options(in_memory)
        .connect_with(options)
        .await
        .context("failed to open database")?;
    Ok(pool)
}

/// Every connection to `sqlite::memory:` is a separate database, so an
/// in-memory pool holds exactly one connection and never recycles it.
fn pool_options(in_memory: bool) -> SqlitePoolOptions {
    if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

/// Expand a leading `~/` in a file-backed SQLite URL and make sure the parent
/// directory exists. In-memory and non-sqlite URLs pass through untouched.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query_part {
        Some(q) => format!("sqlite://{expanded}?{q}"),
        None => format!("sqlite://{expanded}"),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Insert a token unless one with the same `bot_id` is already stored.
/// Returns whether a new row was written.
#[instrument(skip_all, fields(bot_id = %token.bot_id))]
pub async fn insert_access_token(pool: &Pool, token: &AccessToken) -> Result<bool> {
    let res = sqlx::query(
        "INSERT INTO access_token (bot_id, access_token, token_type, owner_user_id, duplicated_template_id, workspace_id, workspace_name, workspace_icon) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(bot_id) DO NOTHING",
    )
    .bind(&token.bot_id)
    .bind(&token.access_token)
    .bind(&token.token_type)
    .bind(token.owner_user_id())
    .bind(token.duplicated_template_id.as_deref())
    .bind(&token.workspace_id)
    .bind(token.workspace_name.as_deref())
    .bind(token.workspace_icon.as_deref())
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

/// Insert a user unless one with the same `id` is already stored.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn insert_user(pool: &Pool, user: &User) -> Result<bool> {
    let res = sqlx::query(
        "INSERT INTO \"user\" (id, type, email, name, avatar_url) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO NOTHING",
    )
    .bind(&user.id)
    .bind(user.kind.as_deref())
    .bind(user.email.as_deref())
    .bind(user.name.as_deref())
    .bind(user.avatar_url.as_deref())
    .execute(pool)
    .await?;
    Ok(res.rows_affected() > 0)
}

#[instrument(skip_all)]
pub async fn find_access_token(pool: &Pool, bot_id: &str) -> Result<Option<StoredAccessToken>> {
    let row = sqlx::query_as::<_, StoredAccessToken>(
        "SELECT bot_id, access_token, token_type, owner_user_id, duplicated_template_id, workspace_id, workspace_name, workspace_icon, created_at \
         FROM access_token WHERE bot_id = ?",
    )
    .bind(bot_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[instrument(skip_all)]
pub async fn count_access_tokens(pool: &Pool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM access_token")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[instrument(skip_all)]
pub async fn find_user(pool: &Pool, id: &str) -> Result<Option<StoredUser>> {
    let row = sqlx::query_as::<_, StoredUser>(
        "SELECT id, type, email, name, avatar_url, created_at FROM \"user\" WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Best-effort persistence used after a token exchange. Storage faults are
/// logged and reported as `false`; a row that already exists is `true`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn upsert_access_token(&self, token: &AccessToken) -> bool;

    async fn upsert_user(&self, user: &User) -> bool;
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[async_trait]
impl TokenStore for SqliteStore {
    async fn upsert_access_token(&self, token: &AccessToken) -> bool {
        match insert_access_token(&self.pool, token).await {
            Ok(inserted) => {
                debug!(bot_id = %token.bot_id, inserted, "access token stored");
                true
            }
            Err(err) => {
                warn!(?err, bot_id = %token.bot_id, "failed to store access token");
                false
            }
        }
    }

    async fn upsert_user(&self, user: &User) -> bool {
        match insert_user(&self.pool, user).await {
            Ok(inserted) => {
                debug!(user_id = %user.id, inserted, "user stored");
                true
            }
            Err(err) => {
                warn!(?err, user_id = %user.id, "failed to store user");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_url_passes_memory_and_other_schemes() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_sqlite_url("postgres://localhost/db"),
            "postgres://localhost/db"
        );
    }

    #[test]
    fn prepare_url_creates_parent_dir() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("nested").join("relay.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let prepared = prepare_sqlite_url(&url);
        assert_eq!(prepared, url);
        assert!(td.path().join("nested").is_dir());
    }

    #[test]
    fn memory_pool_keeps_its_only_connection() {
        let opts = pool_options(true);
        assert_eq!(opts.get_max_connections(), 1);
        assert_eq!(opts.get_min_connections(), 1);
        assert_eq!(opts.get_idle_timeout(), None);
        assert_eq!(opts.get_max_lifetime(), None);

        let file = pool_options(false);
        assert_eq!(file.get_max_connections(), 5);
    }

    #[tokio::test]
    async fn memory_pool_keeps_schema_across_acquires() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        for _ in 0..3 {
            let conn = pool.acquire().await.unwrap();
            drop(conn);
            assert_eq!(count_access_tokens(&pool).await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn init_pool_creates_missing_file() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("relay.db");
        let pool = init_pool(&format!("sqlite://{}", db_path.display()))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        assert!(db_path.exists());
        assert_eq!(count_access_tokens(&pool).await.unwrap(), 0);
    }
}
