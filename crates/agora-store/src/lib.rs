//! # agora-store
//!
//! Document storage for Agora, backed by SQLite.
//!
//! Each post is persisted as a single JSON document that embeds its likes and
//! comments, so deleting a post removes everything it owns in one statement.
//! Users live in a plain relational table. The crate exposes a synchronous
//! [`Database`] handle wrapping a `rusqlite::Connection`; every post mutation
//! goes through [`Database::update_post`], which performs the whole
//! read-modify-write inside one immediate transaction.

pub mod database;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
