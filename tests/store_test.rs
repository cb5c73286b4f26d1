mod common;

use common::*;
use notion_relay::db::{self, SqliteStore, TokenStore};
use notion_relay::model::{AccessToken, User};

fn token(bot_id: &str, access_token: &str) -> AccessToken {
    let mut body = token_json(bot_id, "user-1");
    body["access_token"] = access_token.into();
    serde_json::from_value(body).unwrap()
}

fn user(id: &str, name: &str) -> User {
    User {
        id: id.into(),
        kind: Some("person".into()),
        email: Some("ada@example.com".into()),
        name: Some(name.into()),
        avatar_url: None,
    }
}

#[tokio::test]
async fn storing_same_bot_twice_keeps_one_row() {
    let store = setup_store().await;

    assert!(store.upsert_access_token(&token("bot-1", "secret_first")).await);
    assert!(store.upsert_access_token(&token("bot-1", "secret_second")).await);

    assert_eq!(db::count_access_tokens(store.pool()).await.unwrap(), 1);
    let stored = db::find_access_token(store.pool(), "bot-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "secret_first");
}

#[tokio::test]
async fn insert_reports_whether_row_was_written() {
    let pool = setup_pool().await;
    assert!(db::insert_access_token(&pool, &token("bot-1", "a")).await.unwrap());
    assert!(!db::insert_access_token(&pool, &token("bot-1", "b")).await.unwrap());
    assert!(db::insert_access_token(&pool, &token("bot-2", "c")).await.unwrap());
    assert_eq!(db::count_access_tokens(&pool).await.unwrap(), 2);
}

#[tokio::test]
async fn storing_same_user_twice_is_idempotent() {
    let store = setup_store().await;

    assert!(store.upsert_user(&user("user-1", "Ada")).await);
    assert!(store.upsert_user(&user("user-1", "Someone else")).await);

    let stored = db::find_user(store.pool(), "user-1").await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Ada"));
    assert!(db::find_user(store.pool(), "user-2").await.unwrap().is_none());
}

#[tokio::test]
async fn storage_fault_reports_false() {
    let pool = setup_pool().await;
    let store = SqliteStore::new(pool.clone());
    pool.close().await;

    assert!(!store.upsert_access_token(&token("bot-1", "a")).await);
    assert!(!store.upsert_user(&user("user-1", "Ada")).await);
}
