// 帖子与评论的持久化接口

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::StoreError;
use crate::models::{Comment, NewComment, NewPost, Post, PostFilter, PostPatch};

pub use memory::MemoryBoardStore;
pub use postgres::PgBoardStore;

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError>;
    /// 按创建时间倒序
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError>;
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError>;
    /// 只写补丁中给出的字段。帖子不存在时返回 None
    async fn update_post(
        &self,
        id: &str,
        patch: &PostPatch,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, StoreError>;
    /// 帖子下的评论一并删除。帖子不存在时返回 false
    async fn delete_post(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// 按创建时间正序
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError>;
    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, StoreError>;
    /// 所属帖子不存在时返回 None，不写入
    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, StoreError>;
    async fn update_comment(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, StoreError>;
    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError>;
}
