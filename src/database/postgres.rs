use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{NewUser, Role, UserPatch, UserRecord, normalize_email};

/// 用户表行
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| StoreError::Corrupt(row.id.clone()))?;
        Ok(UserRecord {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'member',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const USER_COLUMNS: &str = "id, email, username, password_hash, role, created_at, updated_at";

/// PostgreSQL 用户存储
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建表，可重复执行
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UserRecord::try_from).collect()
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let id = Uuid::new_v4().to_string();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, username, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(row) => {
                tracing::debug!("Inserted user {}", row.id);
                UserRecord::try_from(row)
            }
            Err(e) => {
                let err = StoreError::from(e);
                if !matches!(err, StoreError::Duplicate) {
                    tracing::error!("Failed to insert user: {}", err);
                }
                Err(err)
            }
        }
    }

    async fn update_profile(
        &self,
        id: &str,
        patch: &UserPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, StoreError> {
        // 未提供的字段保留库中现值，单条语句内完成，不会覆盖并发写入的其他列
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($1, username), email = COALESCE($2, email), updated_at = $3
            WHERE id = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(patch.username.as_deref())
        .bind(patch.email.as_deref().map(normalize_email))
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
                .bind(password_hash)
                .bind(updated_at)
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
