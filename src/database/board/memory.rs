use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CommentStore, PostStore};
use crate::database::StoreError;
use crate::models::{Comment, NewComment, NewPost, Post, PostFilter, PostPatch};

#[derive(Default)]
struct Board {
    posts: HashMap<String, Post>,
    comments: HashMap<String, Comment>,
}

/// 内存帖子与评论存储。两类记录放在同一把锁下，删帖与加评论不会交错
#[derive(Default)]
pub struct MemoryBoardStore {
    board: RwLock<Board>,
}

impl MemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryBoardStore {
    async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.board.read().await.posts.get(id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .board
            .read()
            .await
            .posts
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let record = Post {
            id: Uuid::new_v4().to_string(),
            title: post.title,
            description: post.description,
            categories: post.categories,
            vote_count: 0,
            created_by: post.created_by,
            updated_by: None,
            created_at: post.created_at,
            updated_at: post.created_at,
        };
        self.board
            .write()
            .await
            .posts
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_post(
        &self,
        id: &str,
        patch: &PostPatch,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, StoreError> {
        Ok(self.board.write().await.posts.get_mut(id).map(|post| {
            patch.apply(post);
            post.updated_by = Some(updated_by.to_string());
            post.updated_at = updated_at;
            post.clone()
        }))
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StoreError> {
        let mut board = self.board.write().await;
        if board.posts.remove(id).is_none() {
            return Ok(false);
        }
        board.comments.retain(|_, comment| comment.post_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CommentStore for MemoryBoardStore {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .board
            .read()
            .await
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        Ok(self.board.read().await.comments.get(id).cloned())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, StoreError> {
        let mut board = self.board.write().await;
        if !board.posts.contains_key(&comment.post_id) {
            return Ok(None);
        }

        let record = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: comment.post_id,
            content: comment.content,
            vote_count: 0,
            created_by: comment.created_by,
            created_at: comment.created_at,
            updated_at: comment.created_at,
        };
        board.comments.insert(record.id.clone(), record.clone());
        Ok(Some(record))
    }

    async fn update_comment(
        &self,
        id: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, StoreError> {
        Ok(self.board.write().await.comments.get_mut(id).map(|comment| {
            comment.content = content.to_string();
            comment.updated_at = updated_at;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.board.write().await.comments.remove(id).is_some())
    }
}
