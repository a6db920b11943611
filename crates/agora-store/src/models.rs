//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize`; a [`Post`] is stored
//! verbatim as its JSON document and the same shape is returned to HTTP
//! clients.

use agora_shared::{CommentId, LikeId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user. Credentials are held by the upstream authenticator,
/// never here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Display name, copied onto posts and comments at creation time.
    pub name: String,
    /// Lowercased email address; unique across users.
    pub email: String,
    /// Optional avatar URL.
    pub avatar: Option<String>,
    /// When the user registered.
    pub date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A like on a post. At most one per user per post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Like {
    pub id: LikeId,
    pub user: UserId,
}

/// A comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    /// Author of the comment; the only user allowed to remove it.
    pub user: UserId,
    /// Author display name at the time the comment was written.
    pub name: String,
    /// Author avatar at the time the comment was written.
    pub avatar: Option<String>,
    pub text: String,
    pub date: DateTime<Utc>,
}

/// A post document. Owns its likes and comments, both kept most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    /// Author of the post; the only user allowed to delete it.
    pub user: UserId,
    /// Author display name at the time the post was written.
    pub name: String,
    /// Author avatar at the time the post was written.
    pub avatar: Option<String>,
    pub text: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    /// A fresh post by `author` with no likes or comments.
    pub fn new(author: &User, text: impl Into<String>) -> Self {
        Self {
            id: PostId::new(),
            user: author.id,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            text: text.into(),
            date: Utc::now(),
            likes: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Index of `user`'s like, if any.
    pub fn like_index(&self, user: UserId) -> Option<usize> {
        self.likes.iter().position(|like| like.user == user)
    }

    /// Index of the comment with the given id, if any.
    pub fn comment_index(&self, id: CommentId) -> Option<usize> {
        self.comments.iter().position(|comment| comment.id == id)
    }
}

impl Comment {
    /// A fresh comment by `author`.
    pub fn new(author: &User, text: impl Into<String>) -> Self {
        Self {
            id: CommentId::new(),
            user: author.id,
            name: author.name.clone(),
            avatar: author.avatar.clone(),
            text: text.into(),
            date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User {
            id: UserId::new(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            avatar: Some(format!("https://img.example.com/{name}.png")),
            date: Utc::now(),
        }
    }

    #[test]
    fn new_post_snapshots_author() {
        let author = user("ada");
        let post = Post::new(&author, "hello");
        assert_eq!(post.user, author.id);
        assert_eq!(post.name, "ada");
        assert_eq!(post.avatar, author.avatar);
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn document_uses_lowercase_field_names() {
        let post = Post::new(&user("ada"), "hello");
        let value = serde_json::to_value(&post).unwrap();
        for key in ["id", "user", "name", "avatar", "text", "date", "likes", "comments"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn missing_sequences_default_to_empty() {
        let author = user("ada");
        let json = serde_json::json!({
            "id": PostId::new(),
            "user": author.id,
            "name": "ada",
            "avatar": null,
            "text": "legacy",
            "date": Utc::now(),
        });
        let post: Post = serde_json::from_value(json).unwrap();
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());
    }

    #[test]
    fn lookups_by_user_and_comment_id() {
        let author = user("ada");
        let other = user("bob");
        let mut post = Post::new(&author, "hello");
        post.likes.push(Like {
            id: LikeId::new(),
            user: other.id,
        });
        let comment = Comment::new(&other, "nice");
        let comment_id = comment.id;
        post.comments.push(comment);

        assert_eq!(post.like_index(other.id), Some(0));
        assert_eq!(post.like_index(author.id), None);
        assert_eq!(post.comment_index(comment_id), Some(0));
        assert_eq!(post.comment_index(CommentId::new()), None);
    }
}
