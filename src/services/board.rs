use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::database::{CommentStore, PostStore, StoreError};
use crate::error::AppError;
use crate::models::{
    CATEGORIES, Comment, NewComment, NewPost, Post, PostFilter, PostPatch, is_known_category,
};

/// 帖子与评论。读不走缓存，直接查存储
pub struct PostBoard {
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
    store_timeout: Duration,
}

/// 分类去重并校验，保留首次出现的顺序
fn checked_categories(categories: Vec<String>) -> Result<Vec<String>, AppError> {
    let mut checked: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        let category = category.trim().to_lowercase();
        if !is_known_category(&category) {
            return Err(AppError::BadRequest(format!("未知分类: {category}")));
        }
        if !checked.contains(&category) {
            checked.push(category);
        }
    }
    Ok(checked)
}

fn required(value: &str, message: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(message.into()));
    }
    Ok(value.to_string())
}

impl PostBoard {
    pub fn new(
        posts: Arc<dyn PostStore>,
        comments: Arc<dyn CommentStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            posts,
            comments,
            store_timeout,
        }
    }

    async fn store_call<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        super::store_call(self.store_timeout, fut).await
    }

    pub fn categories(&self) -> &'static [&'static str] {
        CATEGORIES
    }

    pub async fn create_post(
        &self,
        author: &str,
        title: &str,
        description: &str,
        categories: Vec<String>,
    ) -> Result<Post, AppError> {
        let post = NewPost {
            title: required(title, "标题不能为空")?,
            description: required(description, "内容不能为空")?,
            categories: checked_categories(categories)?,
            created_by: author.to_string(),
            created_at: Utc::now(),
        };

        let post = self.store_call(self.posts.insert_post(post)).await?;
        tracing::info!("User {} created post {}", author, post.id);
        Ok(post)
    }

    pub async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, AppError> {
        let filter = PostFilter {
            category: filter.category.map(|c| c.trim().to_lowercase()),
            ..filter
        };
        if let Some(category) = &filter.category {
            if !is_known_category(category) {
                return Err(AppError::BadRequest(format!("未知分类: {category}")));
            }
        }

        self.store_call(self.posts.list_posts(&filter)).await
    }

    pub async fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, AppError> {
        let filter = PostFilter {
            author: Some(user_id.to_string()),
            category: None,
        };
        self.store_call(self.posts.list_posts(&filter)).await
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, AppError> {
        self.store_call(self.posts.find_post(id))
            .await?
            .ok_or(AppError::PostNotFound)
    }

    pub async fn update_post(
        &self,
        id: &str,
        patch: PostPatch,
        editor: &str,
    ) -> Result<Post, AppError> {
        if patch.is_empty() {
            return Err(AppError::BadRequest("没有可更新的字段".into()));
        }

        let patch = PostPatch {
            title: patch
                .title
                .as_deref()
                .map(|t| required(t, "标题不能为空"))
                .transpose()?,
            description: patch
                .description
                .as_deref()
                .map(|d| required(d, "内容不能为空"))
                .transpose()?,
            categories: patch.categories.map(checked_categories).transpose()?,
        };

        let post = self
            .store_call(self.posts.update_post(id, &patch, editor, Utc::now()))
            .await?
            .ok_or(AppError::PostNotFound)?;
        tracing::info!("User {} updated post {}", editor, post.id);
        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        if !self.store_call(self.posts.delete_post(id)).await? {
            return Err(AppError::PostNotFound);
        }
        tracing::info!("Deleted post {} and its comments", id);
        Ok(())
    }

    /// 帖子不存在时返回 `PostNotFound`，而不是空列表
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, AppError> {
        self.get_post(post_id).await?;
        self.store_call(self.comments.list_comments(post_id)).await
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        author: &str,
        content: &str,
    ) -> Result<Comment, AppError> {
        let comment = NewComment {
            post_id: post_id.to_string(),
            content: required(content, "评论内容不能为空")?,
            created_by: author.to_string(),
            created_at: Utc::now(),
        };

        let comment = self
            .store_call(self.comments.insert_comment(comment))
            .await?
            .ok_or(AppError::PostNotFound)?;
        tracing::info!("User {} commented on post {}", author, post_id);
        Ok(comment)
    }

    pub async fn get_comment(&self, id: &str) -> Result<Comment, AppError> {
        self.store_call(self.comments.find_comment(id))
            .await?
            .ok_or(AppError::CommentNotFound)
    }

    pub async fn update_comment(&self, id: &str, content: &str) -> Result<Comment, AppError> {
        let content = required(content, "评论内容不能为空")?;

        self.store_call(self.comments.update_comment(id, &content, Utc::now()))
            .await?
            .ok_or(AppError::CommentNotFound)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<(), AppError> {
        if !self.store_call(self.comments.delete_comment(id)).await? {
            return Err(AppError::CommentNotFound);
        }
        tracing::info!("Deleted comment {}", id);
        Ok(())
    }
}
