//! v001 -- Initial schema creation.
//!
//! Creates the `users` table and the `posts` document table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    name       TEXT NOT NULL,
    email      TEXT NOT NULL COLLATE NOCASE,
    avatar     TEXT,
    created_at TEXT NOT NULL                     -- RFC-3339, fixed width
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- ----------------------------------------------------------------
-- Posts: one JSON document per row, likes and comments embedded
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id         TEXT PRIMARY KEY NOT NULL,        -- UUID v4
    user_id    TEXT NOT NULL,                    -- author, copied from the document
    created_at TEXT NOT NULL,                    -- RFC-3339, fixed width
    version    INTEGER NOT NULL DEFAULT 0,       -- bumped on every save
    doc        TEXT NOT NULL                     -- serialized Post
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
