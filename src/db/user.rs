use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use crate::auth::{DirectoryError, Identity, IdentityProvider, Registration, UserDirectory};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    uuid: String,
    email: String,
    display_name: String,
    refresh_token: Option<String>,
    refresh_token_expires_at: Option<i64>,
}

impl From<UserRow> for Identity {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.uuid,
            email: row.email,
            display_name: row.display_name,
            refresh_token: row.refresh_token,
            refresh_token_expires_at: row.refresh_token_expires_at.map(|t| t.max(0) as u64),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const USER_COLUMNS: &str = "uuid, email, display_name, refresh_token, refresh_token_expires_at";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Identity>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE uuid = ?", USER_COLUMNS))
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Identity::from))
    }

    /// Drop refresh tokens that expired before `now`. Returns the number cleared.
    pub async fn clear_expired_refresh_tokens(&self, now: u64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, refresh_token_expires_at = NULL
             WHERE refresh_token_expires_at IS NOT NULL AND refresh_token_expires_at <= ?",
        )
        .bind(now as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert(
        &self,
        uuid: &str,
        registration: &Registration,
        password_hash: &str,
    ) -> Result<(), DirectoryError> {
        let result = sqlx::query(
            "INSERT INTO users (uuid, email, display_name, phone_number, password_hash)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(&registration.email)
        .bind(&registration.display_name)
        .bind(&registration.phone_number)
        .bind(password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DirectoryError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl UserDirectory for UserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Identity::from))
    }

    async fn store_refresh_token(
        &self,
        user_id: &str,
        refresh_token: &str,
        expires_at: u64,
    ) -> Result<(), DirectoryError> {
        sqlx::query(
            "UPDATE users SET refresh_token = ?, refresh_token_expires_at = ? WHERE uuid = ?",
        )
        .bind(refresh_token)
        .bind(expires_at as i64)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        user_id: &str,
        current: &str,
        replacement: &str,
        expires_at: u64,
    ) -> Result<bool, DirectoryError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?, refresh_token_expires_at = ?
             WHERE uuid = ? AND refresh_token = ?",
        )
        .bind(replacement)
        .bind(expires_at as i64)
        .bind(user_id)
        .bind(current)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_refresh_token(&self, user_id: &str) -> Result<(), DirectoryError> {
        sqlx::query(
            "UPDATE users SET refresh_token = NULL, refresh_token_expires_at = NULL WHERE uuid = ?",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for UserStore {
    async fn register(&self, registration: Registration) -> Result<Identity, DirectoryError> {
        if self.is_email_registered(&registration.email).await? {
            return Err(DirectoryError::EmailTaken);
        }

        let password = registration.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| DirectoryError::PasswordHash(e.to_string()))?
            .map_err(DirectoryError::PasswordHash)?;

        let uuid = Uuid::new_v4().to_string();
        self.insert(&uuid, &registration, &password_hash).await?;

        Ok(Identity {
            user_id: uuid,
            email: registration.email,
            display_name: registration.display_name,
            refresh_token: None,
            refresh_token_expires_at: None,
        })
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, DirectoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {}, password_hash FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password = password.to_string();
        let hash = row.password_hash;
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| DirectoryError::PasswordHash(e.to_string()))?;

        Ok(matches.then(|| Identity::from(row.user)))
    }

    async fn is_email_registered(&self, email: &str) -> Result<bool, DirectoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
