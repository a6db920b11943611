//! Document operations for [`Post`] records.

use agora_shared::PostId;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, TransactionBehavior};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::Post;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new post document.
    pub fn insert_post(&self, post: &Post) -> Result<()> {
        self.conn().execute(
            "INSERT INTO posts (id, user_id, created_at, version, doc)
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![
                post.id.to_string(),
                post.user.to_string(),
                sort_key(&post.date),
                serde_json::to_string(post)?,
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single post by id.
    pub fn find_post(&self, id: PostId) -> Result<Post> {
        let doc: String = self
            .conn()
            .query_row(
                "SELECT doc FROM posts WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map_err(not_found)?;

        Ok(serde_json::from_str(&doc)?)
    }

    /// List all posts, newest first.
    pub fn find_posts(&self) -> Result<Vec<Post>> {
        let mut stmt = self.conn().prepare(
            "SELECT doc FROM posts
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(serde_json::from_str(&row?)?);
        }
        Ok(posts)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Atomically read, mutate and write back one post document.
    ///
    /// The whole sequence runs inside a `BEGIN IMMEDIATE` transaction, so no
    /// other writer can interleave between the read and the write. The write
    /// is additionally guarded by the document version; a mismatch yields
    /// [`StoreError::VersionConflict`]. If `mutate` fails the transaction is
    /// rolled back and its error returned untouched.
    pub fn update_post<T, E, F>(&mut self, id: PostId, mutate: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Post) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        let (mut post, version) = load_versioned(&tx, id)?;

        let out = mutate(&mut post)?;

        save_versioned(&tx, &post, version)?;
        tx.commit().map_err(StoreError::from)?;

        tracing::debug!(post = %id, version = version + 1, "saved post document");
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a post (and everything embedded in it). Returns `true` if a row
    /// was deleted.
    pub fn remove_post(&self, id: PostId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM posts WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    /// Current stored version of a post, if it exists.
    #[cfg(test)]
    pub(crate) fn post_version(&self, id: PostId) -> Result<Option<i64>> {
        use rusqlite::OptionalExtension;

        Ok(self
            .conn()
            .query_row(
                "SELECT version FROM posts WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fixed-width timestamp so that text ordering matches time ordering.
pub(crate) fn sort_key(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn load_versioned(conn: &Connection, id: PostId) -> Result<(Post, i64)> {
    let (doc, version): (String, i64) = conn
        .query_row(
            "SELECT doc, version FROM posts WHERE id = ?1",
            params![id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(not_found)?;

    Ok((serde_json::from_str(&doc)?, version))
}

fn save_versioned(conn: &Connection, post: &Post, version: i64) -> Result<()> {
    let affected = conn.execute(
        "UPDATE posts SET doc = ?1, version = version + 1
         WHERE id = ?2 AND version = ?3",
        params![serde_json::to_string(post)?, post.id.to_string(), version],
    )?;

    if affected == 0 {
        return Err(StoreError::VersionConflict);
    }
    Ok(())
}
