use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};

/// Primary, fast lookup of a user's device push token
#[async_trait]
pub trait PushTokenStore: Send + Sync {
    async fn get_token(&self, user_id: &str) -> Result<Option<String>>;
}

/// User profile records, consulted when the primary token store has nothing
#[async_trait]
pub trait UserProfileStore: Send + Sync {
    async fn get_fcm_token(&self, user_id: &str) -> Result<Option<String>>;
}

/// `push_tokens` table lookups
pub struct PushTokenService {
    pool: PgPool,
}

impl PushTokenService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PushTokenStore for PushTokenService {
    async fn get_token(&self, user_id: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(r#"SELECT token FROM push_tokens WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to look up push token for {}: {:?}", user_id, e);
                AppError::Database(e)
            })
    }
}

/// `user_profiles.fcm_token` lookups
pub struct UserProfileService {
    pool: PgPool,
}

impl UserProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProfileStore for UserProfileService {
    async fn get_fcm_token(&self, user_id: &str) -> Result<Option<String>> {
        let token = sqlx::query_scalar::<_, Option<String>>(
            r#"SELECT fcm_token FROM user_profiles WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up profile token for {}: {:?}", user_id, e);
            AppError::Database(e)
        })?;

        Ok(token.flatten())
    }
}
