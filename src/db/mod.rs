//! Local persistence of OAuth tokens and Notion users.
//!
//! - `model`: rows read back from the store.
//! - `repo`: pool setup, SQL, and the [`TokenStore`] gateway used by the
//!   token exchange flow.
//!
//! Writes are insert-or-ignore keyed by the natural id, so storing the same
//! token or user twice is a no-op.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{StoredAccessToken, StoredUser};
