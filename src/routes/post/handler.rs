use axum::extract::{Json, Path, Query, State, rejection::JsonRejection};

use crate::{
    AppState,
    middleware::AuthUser,
    models::{Post, PostFilter, PostPatch},
    result::ApiResponse,
    routes::{Reply, body},
};

use super::model::{CreatePostRequest, DeletedPostResponse, ListPostsQuery};

#[axum::debug_handler(state = AppState)]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Reply<Post> {
    let req = body(payload)?;

    let post = state
        .board
        .create_post(&claims.sub, &req.title, &req.description, req.categories)
        .await?;
    Ok(ApiResponse::created("帖子创建成功", post))
}

#[axum::debug_handler(state = AppState)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Reply<Vec<Post>> {
    let filter = PostFilter {
        author: None,
        category: query.category,
    };

    let posts = state.board.list_posts(filter).await?;
    Ok(ApiResponse::ok("获取帖子列表成功", posts))
}

#[axum::debug_handler(state = AppState)]
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Reply<Vec<Post>> {
    let posts = state.board.posts_by_user(&user_id).await?;
    Ok(ApiResponse::ok("获取帖子列表成功", posts))
}

#[axum::debug_handler(state = AppState)]
pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> Reply<Post> {
    let post = state.board.get_post(&id).await?;
    Ok(ApiResponse::ok("获取帖子成功", post))
}

#[axum::debug_handler(state = AppState)]
pub async fn update_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<PostPatch>, JsonRejection>,
) -> Reply<Post> {
    caller.require_admin()?;
    let patch = body(payload)?;

    let post = state.board.update_post(&id, patch, &caller.0.sub).await?;
    Ok(ApiResponse::ok("帖子更新成功", post))
}

#[axum::debug_handler(state = AppState)]
pub async fn delete_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Reply<DeletedPostResponse> {
    caller.require_admin()?;

    state.board.delete_post(&id).await?;
    Ok(ApiResponse::ok("帖子删除成功", DeletedPostResponse { id }))
}

#[axum::debug_handler(state = AppState)]
pub async fn list_categories(State(state): State<AppState>) -> Reply<Vec<&'static str>> {
    Ok(ApiResponse::ok("获取分类成功", state.board.categories().to_vec()))
}
