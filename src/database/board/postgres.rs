use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{CommentStore, PostStore};
use crate::database::StoreError;
use crate::models::{Comment, NewComment, NewPost, Post, PostFilter, PostPatch};

#[derive(Debug, FromRow)]
struct PostRow {
    id: String,
    title: String,
    description: String,
    categories: Vec<String>,
    vote_count: i64,
    created_by: String,
    updated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            description: row.description,
            categories: row.categories,
            vote_count: row.vote_count,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: String,
    post_id: String,
    content: String,
    vote_count: i64,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            vote_count: row.vote_count,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CREATE_POSTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        categories TEXT[] NOT NULL DEFAULT '{}',
        vote_count BIGINT NOT NULL DEFAULT 0,
        created_by TEXT NOT NULL,
        updated_by TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_COMMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        vote_count BIGINT NOT NULL DEFAULT 0,
        created_by TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_COMMENTS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS comments_post_id_idx ON comments (post_id)";

const POST_COLUMNS: &str = "id, title, description, categories, vote_count, \
    created_by, updated_by, created_at, updated_at";

const COMMENT_COLUMNS: &str =
    "id, post_id, content, vote_count, created_by, created_at, updated_at";

/// PostgreSQL 帖子与评论存储，删帖时评论由外键级联删除
#[derive(Clone)]
pub struct PgBoardStore {
    pool: PgPool,
}

impl PgBoardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建表，可重复执行
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_POSTS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_COMMENTS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_COMMENTS_INDEX).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgBoardStore {
    async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM posts
            WHERE ($1::TEXT IS NULL OR created_by = $1)
              AND ($2::TEXT IS NULL OR $2 = ANY(categories))
            ORDER BY created_at DESC, id
            "#
        ))
        .bind(filter.author.as_deref())
        .bind(filter.category.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let id = Uuid::new_v4().to_string();

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            INSERT INTO posts
                (id, title, description, categories, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.categories)
        .bind(&post.created_by)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Inserted post {}", row.id);
        Ok(row.into())
    }

    async fn update_post(
        &self,
        id: &str,
        patch: &PostPatch,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, StoreError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            UPDATE posts
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                categories = COALESCE($3, categories),
                updated_by = $4,
                updated_at = $5
            WHERE id = $6
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.categories.as_ref())
        .bind(updated_by)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CommentStore for PgBoardStore {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 ORDER BY created_at, id"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, StoreError> {
        let id = Uuid::new_v4().to_string();

        // 帖子不存在时不插入任何行
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO comments (id, post_id, content, created_by, created_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $5
            WHERE EXISTS (SELECT 1 FROM posts WHERE id = $2)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(&comment.post_id)
        .bind(&comment.content)
        .bind(&comment.created_by)
        .bind(comment.created_at)
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(row) => Ok(row.map(Comment::from)),
            // 帖子在检查之后被删除
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_comment(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            UPDATE comments SET content = $1, updated_at = $2
            WHERE id = $3
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(content)
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
