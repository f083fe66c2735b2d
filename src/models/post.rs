use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 帖子可选的分类，固定集合
pub const CATEGORIES: &[&str] = &[
    "sport",
    "technology",
    "politics",
    "entertainment",
    "science",
    "other",
];

pub fn is_known_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub vote_count: i64,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// 管理员可修改的帖子字段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.categories.is_none()
    }

    pub fn apply(&self, post: &mut Post) {
        if let Some(title) = &self.title {
            post.title = title.clone();
        }
        if let Some(description) = &self.description {
            post.description = description.clone();
        }
        if let Some(categories) = &self.categories {
            post.categories = categories.clone();
        }
    }
}

/// 帖子列表的筛选条件，全部为空时返回所有帖子
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostFilter {
    pub author: Option<String>,
    pub category: Option<String>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        self.author.as_ref().is_none_or(|author| &post.created_by == author)
            && self
                .category
                .as_ref()
                .is_none_or(|category| post.categories.contains(category))
    }
}
