//! Post engagement: creating, reading and deleting posts, and the like /
//! comment mutations applied to them.
//!
//! Every mutation of an existing post runs through
//! [`Database::update_post`](agora_store::Database::update_post), so the
//! membership check and the write happen in one transaction. Two users liking
//! the same post at once both land; the same user liking twice at once gets
//! exactly one success and one conflict.
//!
//! Likes and comments are kept most-recent-first. Author name and avatar are
//! copied onto posts and comments when they are written and never refreshed.

use agora_shared::{CommentId, LikeId, PostId, TextInput, UserId};
use agora_store::{Comment, Like, Post};
use tracing::{debug, info};

use super::SharedDb;
use crate::error::ServerError;

const POST_NOT_FOUND: &str = "Post not found";
const USER_NOT_FOUND: &str = "User not found";
const COMMENT_NOT_FOUND: &str = "Comment does not exist";
const NOT_AUTHORIZED: &str = "User not authorized";
const ALREADY_LIKED: &str = "Post already liked";
const NOT_LIKED: &str = "User has not yet liked the Post";

#[derive(Clone)]
pub struct PostService {
    db: SharedDb,
}

impl PostService {
    pub fn new(db: SharedDb) -> Self {
        Self { db }
    }

    /// Publish a new post by `author`.
    pub async fn create(&self, author: UserId, input: TextInput) -> Result<Post, ServerError> {
        let text = input.into_text().map_err(ServerError::Validation)?;

        self.db
            .run(move |db| {
                let user = db
                    .find_user(author)
                    .map_err(ServerError::from)
                    .map_err(ServerError::missing(USER_NOT_FOUND))?;

                let post = Post::new(&user, text);
                db.insert_post(&post)?;

                info!(post = %post.id, user = %author.short(), "Post created");
                Ok(post)
            })
            .await
    }

    /// All posts, newest first.
    pub async fn list(&self) -> Result<Vec<Post>, ServerError> {
        self.db.run(|db| Ok(db.find_posts()?)).await
    }

    pub async fn get(&self, id: PostId) -> Result<Post, ServerError> {
        self.db
            .run(move |db| {
                db.find_post(id)
                    .map_err(ServerError::from)
                    .map_err(ServerError::missing(POST_NOT_FOUND))
            })
            .await
    }

    /// Delete a post together with its likes and comments. Only the author
    /// may do this.
    pub async fn delete(&self, id: PostId, requester: UserId) -> Result<(), ServerError> {
        self.db
            .run(move |db| {
                let post = db
                    .find_post(id)
                    .map_err(ServerError::from)
                    .map_err(ServerError::missing(POST_NOT_FOUND))?;

                if post.user != requester {
                    debug!(post = %id, user = %requester.short(), "Delete rejected: not the author");
                    return Err(ServerError::Unauthorized(NOT_AUTHORIZED.into()));
                }

                if !db.remove_post(id)? {
                    return Err(ServerError::NotFound(POST_NOT_FOUND.into()));
                }

                info!(post = %id, user = %requester.short(), "Post removed");
                Ok(())
            })
            .await
    }

    /// Like a post. A user can like a given post only once.
    pub async fn like(&self, id: PostId, user: UserId) -> Result<Vec<Like>, ServerError> {
        let likes = self
            .db
            .run(move |db| {
                db.update_post(id, |post| {
                    if post.like_index(user).is_some() {
                        debug!(post = %id, user = %user.short(), "Like rejected: already liked");
                        return Err(ServerError::Conflict(ALREADY_LIKED.into()));
                    }

                    post.likes.insert(
                        0,
                        Like {
                            id: LikeId::new(),
                            user,
                        },
                    );
                    Ok(post.likes.clone())
                })
                .map_err(ServerError::missing(POST_NOT_FOUND))
            })
            .await?;

        info!(post = %id, user = %user.short(), likes = likes.len(), "Post liked");
        Ok(likes)
    }

    /// Withdraw the caller's like.
    pub async fn unlike(&self, id: PostId, user: UserId) -> Result<Vec<Like>, ServerError> {
        let likes = self
            .db
            .run(move |db| {
                db.update_post(id, |post| {
                    let Some(index) = post.like_index(user) else {
                        debug!(post = %id, user = %user.short(), "Unlike rejected: not liked");
                        return Err(ServerError::Conflict(NOT_LIKED.into()));
                    };

                    post.likes.remove(index);
                    Ok(post.likes.clone())
                })
                .map_err(ServerError::missing(POST_NOT_FOUND))
            })
            .await?;

        info!(post = %id, user = %user.short(), likes = likes.len(), "Post unliked");
        Ok(likes)
    }

    /// Add a comment by `user`, newest first.
    pub async fn add_comment(
        &self,
        id: PostId,
        user: UserId,
        input: TextInput,
    ) -> Result<Vec<Comment>, ServerError> {
        let text = input.into_text().map_err(ServerError::Validation)?;

        let comments = self
            .db
            .run(move |db| {
                let author = db
                    .find_user(user)
                    .map_err(ServerError::from)
                    .map_err(ServerError::missing(USER_NOT_FOUND))?;

                db.update_post(id, |post| {
                    post.comments.insert(0, Comment::new(&author, text));
                    Ok::<_, ServerError>(post.comments.clone())
                })
                .map_err(ServerError::missing(POST_NOT_FOUND))
            })
            .await?;

        info!(post = %id, user = %user.short(), comments = comments.len(), "Comment added");
        Ok(comments)
    }

    /// Remove a comment. Only the comment's author may do this; owning the
    /// post grants nothing.
    pub async fn remove_comment(
        &self,
        id: PostId,
        user: UserId,
        comment_id: CommentId,
    ) -> Result<Vec<Comment>, ServerError> {
        let comments = self
            .db
            .run(move |db| {
                db.update_post(id, |post| {
                    let Some(index) = post.comment_index(comment_id) else {
                        return Err(ServerError::NotFound(COMMENT_NOT_FOUND.into()));
                    };

                    if post.comments[index].user != user {
                        debug!(
                            post = %id,
                            comment = %comment_id,
                            user = %user.short(),
                            "Comment removal rejected: not the author"
                        );
                        return Err(ServerError::Unauthorized(NOT_AUTHORIZED.into()));
                    }

                    post.comments.remove(index);
                    Ok(post.comments.clone())
                })
                .map_err(ServerError::missing(POST_NOT_FOUND))
            })
            .await?;

        info!(post = %id, comment = %comment_id, user = %user.short(), "Comment removed");
        Ok(comments)
    }
}
