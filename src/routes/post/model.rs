use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedPostResponse {
    pub id: String,
}
