use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use std::sync::LazyLock;

use super::password::{PasswordError, hash_password, verify_password};

/// Hash checked when the email is unknown, so both login failures cost one
/// Argon2 verification.
static DUMMY_HASH: LazyLock<Result<String, PasswordError>> =
    LazyLock::new(|| hash_password("ideadrop-unknown-account"));

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Public identity of a user. The password hash never leaves this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    uuid: String,
    name: String,
    email: String,
}

impl From<PrincipalRow> for Principal {
    fn from(row: PrincipalRow) -> Self {
        Self {
            id: row.uuid,
            name: row.name,
            email: row.email,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    uuid: String,
    name: String,
    email: String,
    password_hash: String,
}

/// Errors from credential operations.
#[derive(Debug)]
pub enum CredentialError {
    /// A user with this email already exists
    EmailTaken,
    /// Password hashing or hash parsing failed
    Password(PasswordError),
    /// Underlying database error
    Database(sqlx::Error),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::EmailTaken => write!(f, "Email is already registered"),
            CredentialError::Password(e) => write!(f, "{}", e),
            CredentialError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for CredentialError {}

impl From<PasswordError> for CredentialError {
    fn from(e: PasswordError) -> Self {
        CredentialError::Password(e)
    }
}

impl From<sqlx::Error> for CredentialError {
    fn from(e: sqlx::Error) -> Self {
        let unique_violation = e
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        if unique_violation {
            CredentialError::EmailTaken
        } else {
            CredentialError::Database(e)
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user, storing only an Argon2id hash of the password.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Principal, CredentialError> {
        let uuid = uuid::Uuid::new_v4().to_string();
        let password_hash = hash_password(password)?;

        sqlx::query("INSERT INTO users (uuid, name, email, password_hash) VALUES (?, ?, ?, ?)")
            .bind(&uuid)
            .bind(name)
            .bind(email)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        Ok(Principal {
            id: uuid,
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    /// Check an email/password pair.
    /// Unknown email and wrong password both yield `Ok(None)`.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Principal>, CredentialError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            "SELECT uuid, name, email, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            if let Ok(dummy) = DUMMY_HASH.as_ref() {
                verify_password(password, dummy)?;
            }
            return Ok(None);
        };

        if !verify_password(password, &row.password_hash)? {
            return Ok(None);
        }

        Ok(Some(Principal {
            id: row.uuid,
            name: row.name,
            email: row.email,
        }))
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Principal>, sqlx::Error> {
        let row: Option<PrincipalRow> =
            sqlx::query_as("SELECT uuid, name, email FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Principal::from))
    }

    /// Get a user by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Principal>, sqlx::Error> {
        let row: Option<PrincipalRow> =
            sqlx::query_as("SELECT uuid, name, email FROM users WHERE uuid = ?")
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Principal::from))
    }

    /// Delete a user by UUID.
    pub async fn delete(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE uuid = ?")
            .bind(uuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
