pub mod comment;
pub mod post;
pub mod user;

use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    routing::{get, post, put},
};

use crate::{AppState, error::AppError, result::ApiResponse};

pub(crate) type Reply<T> = Result<ApiResponse<T>, AppError>;

/// 请求体解析失败统一按 400 处理
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// 全部路由。认证由 `AuthUser` 提取器完成，管理员检查在处理函数内
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users", post(user::create_user).get(user::list_users))
        .route("/users/me", get(user::get_me).put(user::update_me))
        .route("/users/password", put(user::change_password))
        .route(
            "/users/{id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/users/{id}/posts", get(post::list_user_posts))
        .route("/auth/login", post(user::login))
        .route("/posts", post(post::create_post).get(post::list_posts))
        .route(
            "/posts/{id}",
            get(post::get_post)
                .put(post::update_post)
                .delete(post::delete_post),
        )
        .route(
            "/posts/{id}/comments",
            get(comment::list_comments).post(comment::add_comment),
        )
        .route(
            "/comments/{id}",
            get(comment::get_comment)
                .put(comment::update_comment)
                .delete(comment::delete_comment),
        )
        .route("/categories", get(post::list_categories));

    let base = state.config.api_base_uri.trim_end_matches('/').to_string();
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(&base, api)
    };

    router.with_state(state)
}
