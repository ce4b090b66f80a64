use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Avatar assigned to accounts that never set one.
pub const DEFAULT_AVATAR: &str = "https://static.accountd.dev/avatars/default.png";

/// User record in the credential store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, never exposed in JSON
    pub email: Option<String>,
    pub avatar: String,
    pub privileges: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields the registration flow supplies; everything else defaults in the
/// store (avatar placeholder, privileges 0, timestamps).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
}
