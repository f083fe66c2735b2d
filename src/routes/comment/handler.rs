use axum::extract::{Json, Path, State, rejection::JsonRejection};

use crate::{
    AppState,
    middleware::AuthUser,
    models::Comment,
    result::ApiResponse,
    routes::{Reply, body},
};

use super::model::{CommentRequest, DeletedCommentResponse};

#[axum::debug_handler(state = AppState)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Reply<Vec<Comment>> {
    let comments = state.board.list_comments(&post_id).await?;
    Ok(ApiResponse::ok("获取评论成功", comments))
}

#[axum::debug_handler(state = AppState)]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(post_id): Path<String>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Reply<Comment> {
    let req = body(payload)?;

    let comment = state
        .board
        .add_comment(&post_id, &claims.sub, &req.content)
        .await?;
    Ok(ApiResponse::created("评论发表成功", comment))
}

#[axum::debug_handler(state = AppState)]
pub async fn get_comment(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Comment> {
    let comment = state.board.get_comment(&id).await?;
    Ok(ApiResponse::ok("获取评论成功", comment))
}

#[axum::debug_handler(state = AppState)]
pub async fn update_comment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Reply<Comment> {
    caller.require_admin()?;
    let req = body(payload)?;

    let comment = state.board.update_comment(&id, &req.content).await?;
    Ok(ApiResponse::ok("评论更新成功", comment))
}

#[axum::debug_handler(state = AppState)]
pub async fn delete_comment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Reply<DeletedCommentResponse> {
    caller.require_admin()?;

    state.board.delete_comment(&id).await?;
    Ok(ApiResponse::ok("评论删除成功", DeletedCommentResponse { id }))
}
