//! CRUD operations for [`User`] records.

use agora_shared::UserId;
use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::User;
use crate::posts::sort_key;

impl Database {
    /// Insert a new user. A second user with the same email (compared
    /// case-insensitively) is rejected with [`StoreError::Duplicate`].
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, avatar, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.avatar,
                    sort_key(&user.date),
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    StoreError::Duplicate(format!("email {}", user.email))
                }
                other => StoreError::Sqlite(other),
            })?;
        Ok(())
    }

    /// Fetch a single user by id.
    pub fn find_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name, email, avatar, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let avatar: Option<String> = row.get(3)?;
    let created_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let date: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id: UserId(id),
        name,
        email,
        avatar,
        date,
    })
}
