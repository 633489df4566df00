//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `PromptStore` port from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use muse_core::domain::{GeneratedPrompt, GoogleIdentity, StoredPrompt, UserProfile};
use muse_core::ports::{PortError, PortResult, PromptStore};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PromptStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    display_name: String,
    avatar_url: Option<String>,
}

impl UserRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
        }
    }
}

#[derive(FromRow)]
struct PromptRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    difficulty: String,
    word_count: i32,
    created_at: DateTime<Utc>,
}

impl PromptRecord {
    fn to_domain(self, genres: Vec<String>) -> StoredPrompt {
        StoredPrompt {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            difficulty: self.difficulty,
            word_count: self.word_count as u32,
            genres,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PromptWithGenresRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    difficulty: String,
    word_count: i32,
    created_at: DateTime<Utc>,
    genres: Vec<String>,
}

impl PromptWithGenresRecord {
    fn to_domain(self) -> StoredPrompt {
        StoredPrompt {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            difficulty: self.difficulty,
            word_count: self.word_count as u32,
            genres: self.genres,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `PromptStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PromptStore for PgStore {
    async fn upsert_user(&self, identity: &GoogleIdentity) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, google_sub, email, display_name, avatar_url) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (google_sub) DO UPDATE \
             SET email = EXCLUDED.email, \
                 display_name = EXCLUDED.display_name, \
                 avatar_url = EXCLUDED.avatar_url \
             RETURNING id, email, display_name, avatar_url",
        )
        .bind(Uuid::new_v4())
        .bind(&identity.subject)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(&identity.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, display_name, avatar_url FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("User {} not found", user_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn save_prompt(
        &self,
        user_id: Uuid,
        prompt: &GeneratedPrompt,
    ) -> PortResult<StoredPrompt> {
        // The prompt row and its genre rows commit together or not at all:
        // returning early drops the transaction, which rolls everything back.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, PromptRecord>(
            "INSERT INTO prompts (id, user_id, title, content, difficulty, word_count) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, title, content, difficulty, word_count, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&prompt.title)
        .bind(&prompt.content)
        .bind(&prompt.difficulty)
        .bind(prompt.word_count as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        for genre in &prompt.genres {
            sqlx::query("INSERT INTO prompt_genres (prompt_id, genre) VALUES ($1, $2)")
                .bind(record.id)
                .bind(genre)
                .execute(&mut *tx)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.to_domain(prompt.genres.clone()))
    }

    async fn list_prompts_for_user(&self, user_id: Uuid) -> PortResult<Vec<StoredPrompt>> {
        let records = sqlx::query_as::<_, PromptWithGenresRecord>(
            "SELECT p.id, p.user_id, p.title, p.content, p.difficulty, p.word_count, \
                    p.created_at, \
                    array_remove(array_agg(g.genre), NULL) AS genres \
             FROM prompts p \
             LEFT JOIN prompt_genres g ON g.prompt_id = p.id \
             WHERE p.user_id = $1 \
             GROUP BY p.id \
             ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let prompts = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(prompts)
    }
}
