// 数据库模块
// 用户、帖子与评论的持久化接口与实现

pub mod board;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{NewUser, UserPatch, UserRecord};

pub use board::{CommentStore, MemoryBoardStore, PgBoardStore, PostStore};
pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document store call timed out")]
    Timeout,
    /// 唯一约束冲突（邮箱已存在）
    #[error("duplicate email")]
    Duplicate,
    #[error("corrupt user record {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// 用户集合的存储接口。id 由存储在插入时分配
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
    /// 邮箱已存在时返回 `StoreError::Duplicate`，不覆盖
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;
    /// 只写补丁中给出的字段，密码哈希和角色不受影响。记录不存在时返回 None，
    /// 邮箱被其他记录占用时返回 `StoreError::Duplicate`
    async fn update_profile(
        &self,
        id: &str,
        patch: &UserPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserRecord>, StoreError>;
    /// 只写密码哈希。记录不存在时返回 false
    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    /// 记录不存在时返回 false
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
