use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedCommentResponse {
    pub id: String,
}
