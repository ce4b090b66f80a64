use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::{NewUser, User, DEFAULT_AVATAR};

/// Store failures the authentication service needs to tell apart. Callers
/// collapse both into generic client-facing messages; the split exists so
/// duplicates can be logged as such.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key on {0}")]
    Duplicate(&'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence contract required by the authentication service. The store
/// enforces case-insensitive uniqueness on username and email.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

/// Postgres-backed store.
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        // 23505: unique_violation
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Duplicate("username or email");
        }
    }
    StoreError::Other(e.into())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, email)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, email, avatar, privileges,
                      created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.email)
        .fetch_one(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, avatar, privileges,
                   created_at, updated_at
            FROM users
            WHERE lower(username) = lower($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }
}

/// In-memory store used by unit tests and `AppState::fake()`. Mirrors the
/// Postgres uniqueness rules.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: std::sync::Mutex<Vec<User>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(&new_user.username))
        {
            return Err(StoreError::Duplicate("username"));
        }
        if let Some(ref email) = new_user.email {
            if users
                .iter()
                .any(|u| matches!(&u.email, Some(e) if e.eq_ignore_ascii_case(email)))
            {
                return Err(StoreError::Duplicate("email"));
            }
        }
        let now = time::OffsetDateTime::now_utc();
        let user = User {
            id: uuid::Uuid::new_v4(),
            username: new_user.username,
            password_hash: new_user.password_hash,
            email: new_user.email,
            avatar: DEFAULT_AVATAR.to_string(),
            privileges: 0,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: Option<&str>) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn memory_store_enforces_case_insensitive_username_uniqueness() {
        let store = MemoryCredentialStore::default();
        store.create_user(new_user("someone", None)).await.unwrap();
        let err = store.create_user(new_user("SomeOne", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("username")));
    }

    #[tokio::test]
    async fn memory_store_enforces_email_uniqueness() {
        let store = MemoryCredentialStore::default();
        store
            .create_user(new_user("firstuser", Some("a@b.example")))
            .await
            .unwrap();
        let err = store
            .create_user(new_user("seconduser", Some("A@B.example")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
    }

    #[tokio::test]
    async fn memory_store_lookup_is_case_insensitive() {
        let store = MemoryCredentialStore::default();
        store.create_user(new_user("someone", None)).await.unwrap();
        let found = store.find_by_username("SOMEONE").await.unwrap();
        assert_eq!(found.unwrap().username, "someone");
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn created_user_gets_defaults() {
        let store = MemoryCredentialStore::default();
        let user = store.create_user(new_user("someone", None)).await.unwrap();
        assert_eq!(user.avatar, DEFAULT_AVATAR);
        assert_eq!(user.privileges, 0);
        assert_eq!(user.created_at, user.updated_at);
    }
}
