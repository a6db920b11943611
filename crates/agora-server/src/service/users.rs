use agora_shared::{RegistrationInput, UserId};
use agora_store::{StoreError, User};
use chrono::Utc;
use tracing::info;

use super::SharedDb;
use crate::error::ServerError;

/// Registration and lookup of the users whose name and avatar get copied
/// onto posts and comments.
#[derive(Clone)]
pub struct UserService {
    db: SharedDb,
}

impl UserService {
    pub fn new(db: SharedDb) -> Self {
        Self { db }
    }

    pub async fn register(&self, input: RegistrationInput) -> Result<User, ServerError> {
        input.check().map_err(ServerError::Validation)?;

        let user = User {
            id: UserId::new(),
            name: input.name.unwrap_or_default(),
            email: input.email.unwrap_or_default().to_lowercase(),
            avatar: input.avatar.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            date: Utc::now(),
        };

        self.db
            .run(move |db| match db.insert_user(&user) {
                Ok(()) => {
                    info!(user = %user.id.short(), "User registered");
                    Ok(user)
                }
                Err(StoreError::Duplicate(_)) => {
                    Err(ServerError::Conflict("User already exists".into()))
                }
                Err(e) => Err(e.into()),
            })
            .await
    }

    pub async fn get(&self, id: UserId) -> Result<User, ServerError> {
        self.db
            .run(move |db| {
                db.find_user(id)
                    .map_err(ServerError::from)
                    .map_err(ServerError::missing("User not found"))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use agora_store::Database;

    use super::*;

    fn service() -> UserService {
        UserService::new(SharedDb::new(Database::open_in_memory().unwrap()))
    }

    fn input(name: Option<&str>, email: Option<&str>, avatar: Option<&str>) -> RegistrationInput {
        RegistrationInput {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            avatar: avatar.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn register_normalizes_and_round_trips() {
        let users = service();
        let user = users
            .register(input(Some("Ada"), Some("Ada@Example.com"), Some("")))
            .await
            .unwrap();

        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.avatar, None);

        let fetched = users.get(user.id).await.unwrap();
        assert_eq!(fetched.email, "ada@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let users = service();
        users
            .register(input(Some("Ada"), Some("ada@example.com"), None))
            .await
            .unwrap();

        let err = users
            .register(input(Some("Imposter"), Some("ADA@example.com"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Conflict(msg) if msg == "User already exists"));
    }

    #[tokio::test]
    async fn invalid_payload_lists_fields() {
        let users = service();
        let err = users.register(input(None, Some("nope"), None)).await.unwrap_err();
        match err {
            ServerError::Validation(fields) => assert_eq!(fields.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let err = service().get(UserId::new()).await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }
}
